//! Uploader UI state and its pure rendering.

use crate::models::UploadPayload;

pub const UPLOAD_PLACEHOLDER_URL: &str =
    "https://placehold.co/250x200/e2e8f0/64748b?text=Upload+Image";
pub const RESULT_PLACEHOLDER_URL: &str =
    "https://placehold.co/250x200/e2e8f0/64748b?text=Catified+Image";
pub const LOADING_PLACEHOLDER_URL: &str =
    "https://placehold.co/250x200/e2e8f0/64748b?text=Catifying...";
pub const ERROR_PLACEHOLDER_URL: &str = "https://placehold.co/250x200/FF0000/FFFFFF?text=Error";

/// Where the result area is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing picked yet.
    #[default]
    Idle,
    /// An upload is staged, the result area shows the neutral placeholder.
    Ready,
    Loading,
    Success {
        image_url: String,
    },
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Name shown in the file input; cleared when a pick is rejected.
    pub selected_file: Option<String>,
    pub preview_url: Option<String>,
    pub staged: Option<UploadPayload>,
    pub phase: Phase,
    pub alert: Option<String>,
}

/// Everything a front end needs to draw the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View<'a> {
    pub file_input: Option<&'a str>,
    pub preview_src: &'a str,
    pub result_area_visible: bool,
    pub result_src: &'a str,
    pub result_visible: bool,
    pub spinner_visible: bool,
    pub save_visible: bool,
    pub alert: Option<&'a str>,
}

pub fn render(state: &UiState) -> View<'_> {
    let (result_src, result_visible) = match &state.phase {
        Phase::Idle | Phase::Ready => (RESULT_PLACEHOLDER_URL, false),
        Phase::Loading => (LOADING_PLACEHOLDER_URL, false),
        Phase::Success { image_url } => (image_url.as_str(), true),
        Phase::Failed => (ERROR_PLACEHOLDER_URL, true),
    };

    View {
        file_input: state.selected_file.as_deref(),
        preview_src: state.preview_url.as_deref().unwrap_or(UPLOAD_PLACEHOLDER_URL),
        result_area_visible: !matches!(state.phase, Phase::Idle),
        result_src,
        result_visible,
        spinner_visible: matches!(state.phase, Phase::Loading),
        save_visible: matches!(state.phase, Phase::Success { .. }),
        alert: state.alert.as_deref(),
    }
}
