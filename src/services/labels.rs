use std::collections::HashSet;

const SUB_LABEL_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MainQuestion {
    pub(crate) label: String,
    /// Full labels (`Q1.A`, not `A`) in first-seen order.
    pub(crate) sub_labels: Vec<String>,
}

/// Main question to sub-question grouping derived from flat labels such as `Q1.A` and `Q2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LabelHierarchy {
    mains: Vec<MainQuestion>,
}

impl LabelHierarchy {
    pub(crate) fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mains: Vec<MainQuestion> = Vec::new();
        let mut seen = HashSet::new();

        for label in labels {
            let label = label.as_ref();
            if !seen.insert(label.to_string()) {
                continue;
            }

            let main_label = main_label_of(label);
            match mains.iter_mut().find(|main| main.label == main_label) {
                Some(main) => main.sub_labels.push(label.to_string()),
                None => mains.push(MainQuestion {
                    label: main_label.to_string(),
                    sub_labels: vec![label.to_string()],
                }),
            }
        }

        Self { mains }
    }

    pub(crate) fn mains(&self) -> &[MainQuestion] {
        &self.mains
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.mains.is_empty()
    }
}

/// `Q1.A.i` belongs to `Q1`; a label without a separator is its own main question.
pub(crate) fn main_label_of(label: &str) -> &str {
    label.split_once(SUB_LABEL_SEPARATOR).map_or(label, |(main, _)| main)
}
