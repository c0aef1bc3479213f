/* Alignment */

pub const fn raw_align_up(val: usize, align: usize) -> usize {
    // See https://github.com/rust-lang/rust/blob/e620d0f337d0643c757bab791fc7d88d63217704/src/libcore/alloc.rs#L192
    val.wrapping_add(align).wrapping_sub(1) & !align.wrapping_sub(1)
}

pub const fn raw_is_aligned(val: usize, align: usize) -> bool {
    val & align.wrapping_sub(1) == 0
}

/// Like [`raw_align_up`], but `None` instead of wrapping when the result does not fit.
pub const fn checked_align_up(val: usize, align: usize) -> Option<usize> {
    match val.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up() {
        assert_eq!(raw_align_up(0, 4), 0);
        assert_eq!(raw_align_up(13, 4), 16);
        assert_eq!(raw_align_up(16, 4), 16);
        assert_eq!(raw_align_up(7, 1), 7);
        assert_eq!(checked_align_up(13, 8), Some(16));
        assert_eq!(checked_align_up(usize::MAX, 4), None);
    }

    #[test]
    fn is_aligned() {
        assert!(raw_is_aligned(16, 8));
        assert!(!raw_is_aligned(12, 8));
        assert!(raw_is_aligned(3, 1));
    }
}
