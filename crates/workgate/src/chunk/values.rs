/// The minimal capability a data type needs to be batched by a
/// [`ChunkWorker`](crate::ChunkWorker).
///
/// Implementations must be order preserving: merging `a` then `b` and slicing
/// the result into consecutive ranges must reproduce the elements of `a`
/// followed by those of `b`.
///
/// The neutral element is represented by the worker itself as an empty
/// buffer, so implementors only describe non-trivial values.
///
/// # Example
///
/// ```
/// use workgate::Values;
///
/// let merged = vec![1, 2].merge(vec![3, 4, 5]);
/// assert_eq!(merged.range(1, 4), vec![2, 3, 4]);
/// assert_eq!(Values::len(&merged), 5);
/// ```
pub trait Values: Sized + Send + 'static {
    /// Appends `other` after `self`.
    fn merge(self, other: Self) -> Self;

    /// The elements in `[start, end)`.
    ///
    /// `range(n, n)` with `n == len()` must return a valid empty value.
    fn range(&self, start: usize, end: usize) -> Self;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + 'static> Values for Vec<T> {
    fn merge(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }

    fn range(&self, start: usize, end: usize) -> Self {
        self[start..end].to_vec()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "bytes")))]
#[cfg(feature = "bytes")]
impl Values for bytes::Bytes {
    fn merge(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        let mut merged = bytes::BytesMut::with_capacity(self.len() + other.len());
        merged.extend_from_slice(&self);
        merged.extend_from_slice(&other);
        merged.freeze()
    }

    fn range(&self, start: usize, end: usize) -> Self {
        self.slice(start..end)
    }

    fn len(&self) -> usize {
        bytes::Bytes::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_merge_preserves_order() {
        let merged = vec!['a', 'b'].merge(vec!['c']).merge(Vec::new());
        assert_eq!(merged, vec!['a', 'b', 'c']);
    }

    #[test]
    fn vec_range_tail_is_reusable() {
        let v = vec![1, 2, 3];
        let tail = v.range(3, Values::len(&v));
        assert!(Values::is_empty(&tail));
        assert_eq!(tail.merge(vec![4]), vec![4]);
    }

    #[cfg(feature = "bytes")]
    #[test]
    fn bytes_slices_without_copying() {
        let merged = bytes::Bytes::from_static(b"abc").merge(bytes::Bytes::from_static(b"def"));
        assert_eq!(&merged[..], b"abcdef");
        let head = merged.range(0, 4);
        assert_eq!(&head[..], b"abcd");
        assert!(Values::is_empty(&merged.range(6, 6)));
    }
}
