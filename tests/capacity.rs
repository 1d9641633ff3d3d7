use reversible_share_watermarking as rsw;
mod util;
use rsw::grid;
use rsw::{EmbedConfig, Embedder};
use util::{generate_fixed_bits, generate_smooth_grid};

#[test]
fn test_bitstream_longer_than_capacity() {
    let source = generate_smooth_grid(21, 32, 32);
    let embedder = Embedder::new(source.clone(), EmbedConfig::default()).unwrap();
    let capacity = embedder.capacity();
    let bits = generate_fixed_bits(8, 4 * capacity + 10);

    let embedding = embedder.mark(&bits);
    assert!(embedding.is_truncated());
    assert_eq!(embedding.side_info.requested, bits.len());
    assert_eq!(embedding.side_info.embedded, capacity);
    assert_eq!(embedding.positions.len(), capacity);

    // The side information limits the extraction to the bits that made it in.
    let extraction = rsw::algorithm::extract(&embedding.marked, &embedding.side_info);
    assert_eq!(extraction.bits[..], bits[..capacity]);
    assert_eq!(extraction.recover(&embedding.marked).unwrap(), source);
}

#[test]
fn test_no_admissible_block() {
    // Fixed threshold that no block has; everything above gets shifted, nothing embedded.
    let source = grid::filled(6, 6, 30);
    let embedding =
        rsw::algorithm::embed(&source, &[true, false], rsw::Admission::Fixed(-5)).unwrap();
    assert_eq!(embedding.side_info.embedded, 0);
    assert!(embedding.positions.is_empty());
    assert_eq!(grid::value(&embedding.marked, 5, 5), 31);

    let extraction = rsw::algorithm::extract(&embedding.marked, &embedding.side_info);
    assert!(extraction.bits.is_empty());
}

#[test]
fn test_odd_dimensions_stay_in_bounds() {
    let source = generate_smooth_grid(4, 9, 7);
    let bits = generate_fixed_bits(1, 100);
    let embedding = rsw::algorithm::embed(&source, &bits, rsw::Admission::Mode).unwrap();
    assert!(embedding.side_info.embedded <= 12);
    // The trailing row and column are never modified.
    for col in 0..9 {
        assert_eq!(grid::value(&embedding.marked, 6, col), grid::value(&source, 6, col));
    }
    for row in 0..7 {
        assert_eq!(grid::value(&embedding.marked, row, 8), grid::value(&source, row, 8));
    }
}
