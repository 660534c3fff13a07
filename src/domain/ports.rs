/// Source of roll values in `[0, 100.01)`.
///
/// The trial runner only sees this trait, so the keyed-hash generator and
/// the fast generator are interchangeable.
pub trait RollSource {
    /// Appends `count` rolls to `buf` and advances the nonce by `count`.
    fn fill_rolls(&mut self, buf: &mut Vec<f64>, count: usize);

    fn next_rolls(&mut self, count: usize) -> Vec<f64> {
        let mut rolls = Vec::with_capacity(count);
        self.fill_rolls(&mut rolls, count);
        rolls
    }
}

impl<R: RollSource + ?Sized> RollSource for Box<R> {
    fn fill_rolls(&mut self, buf: &mut Vec<f64>, count: usize) {
        (**self).fill_rolls(buf, count);
    }
}
