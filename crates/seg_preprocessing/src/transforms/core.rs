use anyhow::{Context, Result};
use std::marker::PhantomData;

/// Composable preprocessing step.
///
/// A `Transform<I, O>` turns an `I` into an `O` without keeping state
/// between calls, so one instance can be shared by any number of worker
/// threads. Steps are composed with `.then(...)`:
///
/// ```ignore
/// let augment = RandomPairFlip::default().then(MeanSubtraction::rgb_means());
/// let sample = augment.apply(sample)?;
/// ```
///
/// `then()` requires the output type of `self` to equal the input type of
/// `next`, and both intermediate and final types to be `Send`.
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain::new(self, next)
    }
}

/// Two transforms run back to back (`A` then `B`).
/// `PhantomData<M>` pins the intermediate type.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Use [`Transform::then`] in most code; `Chain::new` is handy when the
    /// steps are picked at runtime from a config.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        let mid = self.first.apply(input)?;
        self.second.apply(mid).with_context(|| {
            format!(
                "Transform chain failed: {} → {}",
                std::any::type_name::<A>(),
                std::any::type_name::<B>()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessError;
    use anyhow::anyhow;
    use ndarray::Array3;

    struct Double;
    impl Transform<Array3<f32>, Array3<f32>> for Double {
        fn apply(&self, input: Array3<f32>) -> Result<Array3<f32>> {
            Ok(input * 2.0)
        }
    }

    struct Height;
    impl Transform<Array3<f32>, usize> for Height {
        fn apply(&self, input: Array3<f32>) -> Result<usize> {
            Ok(input.dim().0)
        }
    }

    #[test]
    fn test_then_runs_in_order() -> Result<()> {
        let pipeline = Double.then(Double);
        let out = pipeline.apply(Array3::<f32>::from_elem((2, 2, 1), 1.5))?;
        assert!(out.iter().all(|&v| v == 6.0));
        Ok(())
    }

    #[test]
    fn test_chain_changes_type() -> Result<()> {
        let chain = Chain::new(Double, Height);
        assert_eq!(chain.apply(Array3::<f32>::zeros((7, 2, 3)))?, 7);
        Ok(())
    }

    #[test]
    fn test_chain_error_keeps_typed_cause() {
        struct Reject;
        impl Transform<Array3<f32>, Array3<f32>> for Reject {
            fn apply(&self, _: Array3<f32>) -> Result<Array3<f32>> {
                Err(anyhow!(PreprocessError::Config("rejected".into())))
            }
        }

        let chain = Chain::new(Double, Reject);
        let err = chain.apply(Array3::<f32>::zeros((1, 1, 1))).unwrap_err();
        assert!(err.to_string().contains("Transform chain failed"));
        assert!(err.to_string().contains("Reject"));
        assert!(matches!(
            err.downcast_ref::<PreprocessError>(),
            Some(PreprocessError::Config(_))
        ));
    }
}
