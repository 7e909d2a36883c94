//! Dense vector helpers for the latent factors.

use rand::Rng;

pub type Vector = Vec<f32>;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `target += source * scale`
pub fn add_scaled(target: &mut [f32], source: &[f32], scale: f32) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += s * scale;
    }
}

/// Uniform random vector in `[-scale, scale)`; all zeros when `scale <= 0`
pub fn random_vector<R: Rng>(rng: &mut R, len: usize, scale: f32) -> Vector {
    if scale <= 0.0 {
        return vec![0.0; len];
    }
    (0..len).map(|_| rng.random_range(-scale..scale)).collect()
}

/// Sum of `vectors` divided by `sqrt(count)`.
///
/// `count` is the size of the set the vectors were drawn from, which may
/// exceed the number of vectors found. Returns zeros when `count` is 0.
pub fn normalized_sum<'a, I>(vectors: I, count: usize, len: usize) -> Vector
where
    I: IntoIterator<Item = &'a Vector>,
{
    let mut sum = vec![0.0; len];
    for v in vectors {
        add_scaled(&mut sum, v, 1.0);
    }
    if count > 0 {
        let norm = (count as f32).sqrt();
        sum.iter_mut().for_each(|x| *x /= norm);
    }
    sum
}
