use std::{iter::Iterator, path::PathBuf};

use serde::{Deserialize, Serialize};

/// One evaluation question: an image, the question asked about it and the
/// expected binary answer (1 = yes, 0 = no).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub image_path: PathBuf,
    pub prompt: String,
    pub label: u8,
}

pub struct DatasetIterator<'a, I> {
    current: usize,
    dataset: &'a dyn Dataset<I>,
}

impl<'a, I> DatasetIterator<'a, I> {
    pub fn new<D>(dataset: &'a D) -> Self
    where
        D: Dataset<I>,
    {
        DatasetIterator {
            current: 0,
            dataset,
        }
    }
}

impl<I> Iterator for DatasetIterator<'_, I> {
    type Item = (usize, I);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current;
        let item = self.dataset.get(index)?;
        self.current += 1;
        Some((index, item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

/// Random-access collection of records; iteration yields `(index, record)`
/// so failures can be reported against the record index.
pub trait Dataset<I>: Send + Sync {
    fn get(&self, index: usize) -> Option<I>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> DatasetIterator<'_, I>
    where
        Self: Sized,
    {
        DatasetIterator::new(self)
    }
}

/// Records already held in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryDataset<I>(pub Vec<I>);

impl<I> From<Vec<I>> for InMemoryDataset<I> {
    fn from(records: Vec<I>) -> Self {
        Self(records)
    }
}

impl<I: Clone + Send + Sync> Dataset<I> for InMemoryDataset<I> {
    fn get(&self, index: usize) -> Option<I> {
        self.0.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_with_indices() {
        let records = InMemoryDataset::from(vec!["a".to_string(), "b".to_string()]);
        let indexed: Vec<(usize, String)> = records.iter().collect();
        assert_eq!(indexed, vec![(0, "a".to_string()), (1, "b".to_string())]);
        assert_eq!(records.iter().size_hint(), (2, Some(2)));
        assert_eq!(records.get(2), None);
    }

    #[test]
    fn plain_vectors_keep_slice_methods() {
        // a Vec in scope of the trait still resolves to slice get/iter
        let records = vec![QuestionRecord {
            image_path: PathBuf::from("a.png"),
            prompt: "q".to_string(),
            label: 1,
        }];
        assert_eq!(records.get(0).cloned().map(|r| r.label), Some(1));
        assert_eq!(records.iter().map(|r| r.label).sum::<u8>(), 1);
    }
}
