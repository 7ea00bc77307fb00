use anyhow::{Context, Result};

/// Iterator adaptor with a pushback buffer, used by the parser for one token of lookahead.
pub struct MultiPeek<T: Iterator> {
    buffer: Vec<Option<<T as Iterator>::Item>>,
    iter: T,
}
impl<T: Iterator + Sized> MultiPeek<T> {
    pub fn new<U: IntoIterator<IntoIter = T, Item = T::Item>>(val: U) -> Self {
        let iter = val.into_iter();
        Self {
            iter,
            buffer: Vec::with_capacity(5),
        }
    }
    pub fn peek_next(&mut self) -> Option<&T::Item> {
        if self.buffer.is_empty() {
            let value = self.iter.next();
            self.buffer.push(value);
        }
        self.buffer.last().and_then(Option::as_ref)
    }
}
impl<T: Iterator> MultiPeek<T>
where
    T::Item: Copy,
{
    pub fn next_res(&mut self) -> Result<T::Item> {
        self.next().context("unexpected end of input")
    }
    pub fn peek_next_res(&mut self) -> Result<T::Item> {
        self.peek_next().copied().context("unexpected end of input")
    }
    /// Drops the next item, failing at end of input.
    pub fn discard(&mut self) -> Result<()> {
        self.next_res().map(|_| ())
    }
}

impl<T: Iterator> Iterator for MultiPeek<T> {
    type Item = <T as Iterator>::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next) = self.buffer.pop() {
            return next;
        }
        self.iter.next()
    }
}

pub trait IteratorExt: Iterator {
    fn multipeek(self) -> MultiPeek<Self>
    where
        Self: Sized,
    {
        MultiPeek::new(self)
    }
}

impl<T: Iterator + Sized> IteratorExt for T {}
