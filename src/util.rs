use crate::grid::{self, PixelGrid};
use crate::prediction;

/// Clip a value to the pixel range.
#[inline]
pub fn clip(value: i32) -> u8 {
    value.clamp(0, u8::MAX as i32) as u8
}

/// Render the prediction errors of each block as a grid with one pixel per block.
///
/// Errors are stretched to the full range, so the map is only useful for inspection.
pub fn error_map(image: &PixelGrid) -> PixelGrid {
    let (width, height) = image.dimensions();
    let errors: Vec<i32> = prediction::scan(image).map(|r| r.error).collect();
    let min = errors.iter().copied().min().unwrap_or(0);
    let max = errors.iter().copied().max().unwrap_or(0);
    let span = (max - min).max(1);
    let blocks_wide = width / 2;
    grid::from_fn(blocks_wide, height / 2, |row, col| {
        let e = errors[(row * blocks_wide + col) as usize];
        (((e - min) * 255) / span) as u8
    })
}

/// Write the error map of the grid to disk.
pub fn dump_error_map(image: &PixelGrid, path: &std::path::Path) -> crate::Result<()> {
    error_map(image).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip(-3), 0);
        assert_eq!(clip(256), 255);
        assert_eq!(clip(17), 17);
    }

    #[test]
    fn test_error_map() {
        let mut image = grid::filled(4, 2, 10);
        grid::set_value(&mut image, 1, 3, 20);
        let map = error_map(&image);
        assert_eq!(map.dimensions(), (2, 1));
        assert_eq!(grid::value(&map, 0, 0), 0);
        assert_eq!(grid::value(&map, 0, 1), 255);
    }
}
