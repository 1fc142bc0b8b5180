use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tablog_types::{ClassifiedLine, SeverityLevel};

use crate::rules::RuleSet;

/// How many lines to classify between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Applies a rule set to raw lines
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Arc<RuleSet>,
}

impl Classifier {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// Classify every line. Output order and length match the input and
    /// `original_index` equals the position.
    pub fn classify_all<I>(&self, lines: I) -> Vec<ClassifiedLine>
    where
        I: IntoIterator<Item = String>,
    {
        lines
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                let level = self.rules.classify(&text);
                ClassifiedLine::new(index, level, text)
            })
            .collect()
    }

    /// Like [`Classifier::classify_all`], returning `None` once the token is cancelled
    pub fn classify_all_cancellable<I>(
        &self,
        lines: I,
        cancel: &CancellationToken,
    ) -> Option<Vec<ClassifiedLine>>
    where
        I: IntoIterator<Item = String>,
    {
        let iter = lines.into_iter();
        let mut classified = Vec::with_capacity(iter.size_hint().0);

        for (index, text) in iter.enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
            let level = self.rules.classify(&text);
            classified.push(ClassifiedLine::new(index, level, text));
        }

        Some(classified)
    }
}

/// Wrap lines without classifying them (every line is `Text`)
pub fn classify_plain<I>(lines: I) -> Vec<ClassifiedLine>
where
    I: IntoIterator<Item = String>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| ClassifiedLine::new(index, SeverityLevel::Text, text))
        .collect()
}
