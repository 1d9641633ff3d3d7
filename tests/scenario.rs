use reversible_share_watermarking as rsw;
use rsw::grid;
use rsw::{bitplane, Admission, Extractor, PermutationMap};

#[test]
fn test_uniform_grid_four_bits() {
    // ================ Start of embedding section. ================

    let source = grid::filled(8, 8, 128);
    let planes = bitplane::split(&source, 4).unwrap();
    assert_eq!(planes.reconstruct().unwrap(), source);

    let bits = vec![true, false, true, true];
    let embedding = rsw::algorithm::embed(&source, &bits, Admission::Mode).unwrap();
    assert_eq!(embedding.side_info.threshold, 0);

    let values: Vec<u8> = embedding
        .positions
        .iter()
        .map(|&(row, col)| grid::value(&embedding.marked, row, col))
        .collect();
    assert_eq!(values, vec![129, 128, 129, 129]);

    // ================ End of embedding section. ================

    // ================ Start of extraction section. ================

    let extraction = Extractor::from_side_info(&embedding.side_info).extract(&embedding.marked);
    assert_eq!(extraction.bits, bits);
    assert_eq!(extraction.positions, embedding.positions);

    let recovered = extraction.recover(&embedding.marked).unwrap();
    for &(row, col) in extraction.positions.iter() {
        assert_eq!(grid::value(&recovered, row, col), 128);
    }
    assert_eq!(recovered, source);

    // ================ End of extraction section. ================
}

#[test]
fn test_uniform_grid_legacy_extraction() {
    // With a mode of 0 the fixed {0, 1} window reads the same bits.
    let source = grid::filled(8, 8, 128);
    let bits = vec![true, false, true, true];
    let embedding = rsw::algorithm::embed(&source, &bits, Admission::Mode).unwrap();
    let extraction = rsw::algorithm::extract(&embedding.marked, &rsw::SideInfo::legacy(4));
    assert_eq!(extraction.bits, bits);
}

#[test]
fn test_scramble_key_dependence() {
    // Each 2x2 block holds its own block number.
    let source = grid::from_fn(8, 8, |row, col| ((row / 2) * 4 + col / 2) as u8);
    let key = 0xDEADBEEF;

    let scrambled = rsw::scramble(&source, 2, key).unwrap();
    assert_ne!(scrambled, source);
    assert_eq!(rsw::unscramble(&scrambled, 2, key).unwrap(), source);

    // Blocks stay intact while moving.
    let map = PermutationMap::new(8, 8, 2, key).unwrap();
    for p in 0..map.block_count() {
        let (row, col) = ((p as u32 / 4) * 2, (p as u32 % 4) * 2);
        let src = map.source_of(p);
        assert_eq!(grid::value(&scrambled, row, col), (src.row * 4 + src.col) as u8);
    }

    let wrong = rsw::unscramble(&scrambled, 2, key + 1).unwrap();
    assert_ne!(wrong, source);
}
