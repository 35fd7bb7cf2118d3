//! Page models: what each screen loads, how it filters, and how it renders as text.

pub mod dashboard;
pub mod directory;
pub mod mood_form;
pub mod moods;
