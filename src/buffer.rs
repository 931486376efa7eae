//! Reference-counted sample buffers passed between stages.
//!
//! A `Buffer<T>` is a cheap handle onto a shared, fixed-capacity block of
//! storage. Cloning a handle (or taking a `head` view, or reinterpreting the
//! storage as another sample type) bumps the reference count; dropping or
//! `unref`-ing a handle releases it, and the storage is freed with the last
//! handle. Whether a receiver may write into a buffer is not tracked here,
//! that is what the `allow_overwrite` flag of `Sink::process` is for.
//!
//! The storage is a vector of 8-byte words, so it is suitably aligned for
//! every `Sample` type and can be viewed as any of them.

use crate::sample::{Sample, SampleType};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr;
use std::rc::Rc;
use std::slice;

const WORD: usize = mem::size_of::<u64>();

/// A typed handle onto shared sample storage.
pub struct Buffer<T: Sample> {
    storage: Rc<RefCell<Vec<u64>>>,
    capacity: usize,
    len: usize,
    _sample: PhantomData<T>,
}

impl<T: Sample> Buffer<T> {
    /// Allocates zeroed storage for `capacity` samples. All samples are
    /// valid, i.e. `len() == capacity`.
    ///
    /// # Panics
    ///
    /// Panics if the size of the storage in bytes overflows `usize`.
    pub fn new(capacity: usize) -> Self {
        let bytes = match capacity
            .checked_mul(mem::size_of::<T>())
            .and_then(|b| b.checked_add(WORD - 1))
        {
            Some(bytes) => bytes,
            None => panic!("capacity overflow"),
        };
        let words = bytes / WORD;
        Buffer {
            storage: Rc::new(RefCell::new(vec![0u64; words])),
            capacity,
            len: capacity,
            _sample: PhantomData,
        }
    }

    /// Allocates a buffer holding a copy of `samples`.
    ///
    /// # Examples
    ///
    /// ```
    /// use comms_demod::buffer::Buffer;
    ///
    /// let buf = Buffer::from_slice(&[1i16, 2, 3]);
    /// assert_eq!(buf.len(), 3);
    /// assert_eq!(buf.to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn from_slice(samples: &[T]) -> Self {
        let buffer = Buffer::new(samples.len());
        buffer.borrow_mut().copy_from_slice(samples);
        buffer
    }

    /// Number of valid samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of samples the storage can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_type(&self) -> SampleType {
        T::TYPE
    }

    /// Returns a view of the first `n` valid samples without copying.
    pub fn head(&self, n: usize) -> Buffer<T> {
        Buffer {
            storage: Rc::clone(&self.storage),
            capacity: self.capacity,
            len: n.min(self.len),
            _sample: PhantomData,
        }
    }

    /// Views the same storage as samples of type `U`. Capacity and length
    /// are rescaled by the ratio of the sample sizes.
    pub fn reinterpret<U: Sample>(&self) -> Buffer<U> {
        Buffer {
            storage: Rc::clone(&self.storage),
            capacity: self.capacity * mem::size_of::<T>() / mem::size_of::<U>(),
            len: self.len * mem::size_of::<T>() / mem::size_of::<U>(),
            _sample: PhantomData,
        }
    }

    /// Immutable access to the valid samples.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed mutably.
    pub fn borrow(&self) -> Ref<'_, [T]> {
        let len = self.len;
        Ref::map(self.storage.borrow(), |words| {
            // SAFETY: the storage holds at least `capacity >= len` samples of
            // `T`, is 8-byte aligned, and every bit pattern is a valid `T`.
            unsafe { slice::from_raw_parts(words.as_ptr() as *const T, len) }
        })
    }

    /// Mutable access to the valid samples.
    ///
    /// # Panics
    ///
    /// Panics if the storage is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, [T]> {
        let len = self.len;
        RefMut::map(self.storage.borrow_mut(), |words| {
            // SAFETY: see `borrow`; the `RefMut` guarantees exclusivity.
            unsafe { slice::from_raw_parts_mut(words.as_mut_ptr() as *mut T, len) }
        })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.borrow().to_vec()
    }

    /// Number of handles currently sharing the storage.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.storage)
    }

    /// Releases this handle. The storage is freed once no handle is left.
    pub fn unref(self) {}

    /// Returns true if both handles refer to the same storage.
    pub fn shares_storage<U: Sample>(&self, other: &Buffer<U>) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }
}

impl<T: Sample> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Buffer {
            storage: Rc::clone(&self.storage),
            capacity: self.capacity,
            len: self.len,
            _sample: PhantomData,
        }
    }
}

impl<T: Sample> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("type", &T::TYPE)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Maps the samples `start..n` of `input` through `f` into the same
/// positions of `output`, where `n` is the smaller of both lengths. Output
/// slots before `start` are left untouched. Returns `n`.
///
/// `output` may alias `input` (e.g. a reinterpretation of it) as long as an
/// output sample is not larger than an input sample: slot `i` of the output
/// then only covers input bytes of samples `0..=i`, which have already been
/// read.
///
/// # Panics
///
/// Panics if the buffers alias and `O` is larger than `I`.
pub fn transform<I, O, F>(input: &Buffer<I>, output: &Buffer<O>, start: usize, mut f: F) -> usize
where
    I: Sample,
    O: Sample,
    F: FnMut(I) -> O,
{
    let n = input.len().min(output.len());
    if input.shares_storage(output) {
        assert!(
            mem::size_of::<O>() <= mem::size_of::<I>(),
            "in-place transform from {} to {} would overrun unread input",
            I::TYPE,
            O::TYPE
        );
        let mut words = input.storage.borrow_mut();
        let base = words.as_mut_ptr() as *mut u8;
        for i in start..n {
            // SAFETY: `i < n` keeps both offsets inside the storage, offsets
            // are multiples of the sample sizes so they are aligned, and the
            // write only touches bytes of samples that were already read.
            unsafe {
                let x = ptr::read(base.add(i * mem::size_of::<I>()) as *const I);
                ptr::write(base.add(i * mem::size_of::<O>()) as *mut O, f(x));
            }
        }
    } else {
        let src = input.borrow();
        let mut dst = output.borrow_mut();
        for (out, x) in dst[..n].iter_mut().zip(src[..n].iter()).skip(start) {
            *out = f(*x);
        }
    }
    n
}
