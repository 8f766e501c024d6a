use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(SubTaskId);

/// Text sent as the summary query when the user never entered a goal.
pub const DEFAULT_SUMMARY_PROMPT: &str = "Help me plan based on my preferences";

const LIKES_SEPARATOR: &str = ". ";
const LIKES_PREFIX: &str = "I like ";
const LIKES_JOINER: &str = " and ";

/// One step of a decomposed goal.
///
/// The text is what the backend produced and what routes address; the id is
/// assigned locally so duplicate texts stay distinguishable in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: SubTaskId,
    pub text: String,
}

impl SubTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: SubTaskId::new(),
            text: text.into(),
        }
    }
}

/// Builds a fresh sub-task list from raw backend text, dropping blank lines.
pub fn sub_tasks_from_texts<I, S>(texts: I) -> Vec<SubTask>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .map(Into::into)
        .filter(|text: &String| !text.trim().is_empty())
        .map(SubTask::new)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub recommended: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("option index {index} out of range for {len} options")]
pub struct SelectionOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Checkbox state for the alternatives of one [`OptionSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    flags: Vec<bool>,
}

impl Selection {
    pub fn for_options(options: &OptionSet) -> Self {
        Self::unchecked(options.options.len())
    }

    pub fn unchecked(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    pub fn toggle(&mut self, index: usize) -> Result<bool, SelectionOutOfRange> {
        let len = self.flags.len();
        let flag = self
            .flags
            .get_mut(index)
            .ok_or(SelectionOutOfRange { index, len })?;
        *flag = !*flag;
        Ok(*flag)
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn any_checked(&self) -> bool {
        self.flags.iter().any(|flag| *flag)
    }

    /// Checked option texts in option order.
    pub fn selected_texts(&self, options: &OptionSet) -> Vec<String> {
        options
            .options
            .iter()
            .zip(self.flags.iter())
            .filter(|(_, checked)| **checked)
            .map(|(text, _)| text.clone())
            .collect()
    }
}

/// Appends an "I like ..." clause to free-text personalization.
///
/// Returns `None` when nothing was liked so callers can leave stored text untouched.
pub fn append_likes(existing: &str, liked: &[String]) -> Option<String> {
    if liked.is_empty() {
        return None;
    }

    let mut next = existing.to_string();
    if !existing.is_empty() {
        next.push_str(LIKES_SEPARATOR);
    }
    next.push_str(LIKES_PREFIX);
    next.push_str(&liked.join(LIKES_JOINER));
    Some(next)
}
