/// Generation state machine
///
/// Tracks the single in-flight request, its status message, the last
/// result and the last error. What the canvas shows follows a fixed
/// priority: loading, then error, then result, then the empty state.

use super::data::{GeneratedContent, ToolType};

/// Upstream message that means the selected API key is no longer valid
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Message shown instead of the upstream one when the key must be re-selected
pub const KEY_RESELECT_MESSAGE: &str = "API Key error. Please re-select your key.";

/// Token identifying one generation request.
///
/// Completions carrying a ticket that is no longer pending are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    tool: ToolType,
}

impl Ticket {
    pub fn tool(&self) -> ToolType {
        self.tool
    }
}

/// What the canvas should display right now
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<'a> {
    Idle,
    Loading(&'a str),
    Failed(&'a str),
    Succeeded(&'a GeneratedContent),
}

/// How a service failure is presented
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    /// The video tool must ask for a key again
    pub reset_credentials: bool,
}

/// Map a raw service error message to what the user sees
pub fn classify_failure(tool: ToolType, raw_message: &str) -> Failure {
    if tool == ToolType::VideoGenerator && raw_message.contains(ENTITY_NOT_FOUND) {
        return Failure {
            message: KEY_RESELECT_MESSAGE.to_string(),
            reset_credentials: true,
        };
    }

    let message = if raw_message.trim().is_empty() {
        tool.fallback_error().to_string()
    } else {
        raw_message.to_string()
    };

    Failure {
        message,
        reset_credentials: false,
    }
}

#[derive(Debug, Default)]
pub struct GenerationState {
    loading: Option<String>,
    result: Option<GeneratedContent>,
    error: Option<String>,
    pending: Option<Ticket>,
    next_id: u64,
}

impl GenerationState {
    /// Enter `Loading` for a new request.
    ///
    /// Returns `None` while another request is still in flight.
    pub fn begin(&mut self, tool: ToolType, message: impl Into<String>) -> Option<Ticket> {
        if self.pending.is_some() {
            return None;
        }

        self.next_id += 1;
        let ticket = Ticket {
            id: self.next_id,
            tool,
        };

        self.pending = Some(ticket);
        self.loading = Some(message.into());
        self.error = None;

        Some(ticket)
    }

    /// A local precondition failed; the service is never contacted.
    pub fn reject(&mut self, message: impl Into<String>) {
        if self.is_loading() {
            return;
        }
        self.error = Some(message.into());
    }

    /// Replace the loading message of the pending request
    pub fn progress(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        if !self.is_pending(ticket) {
            return false;
        }
        self.loading = Some(message.into());
        true
    }

    /// Store a result for the pending request and clear any error
    pub fn succeed(&mut self, ticket: Ticket, content: GeneratedContent) -> bool {
        if !self.finish(ticket) {
            return false;
        }
        self.result = Some(content);
        self.error = None;
        true
    }

    /// Record a failure for the pending request; the previous result is kept
    pub fn fail(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        if !self.finish(ticket) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    pub fn phase(&self) -> Phase<'_> {
        if let Some(message) = &self.loading {
            Phase::Loading(message)
        } else if let Some(error) = &self.error {
            Phase::Failed(error)
        } else if let Some(result) = &self.result {
            Phase::Succeeded(result)
        } else {
            Phase::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn result(&self) -> Option<&GeneratedContent> {
        self.result.as_ref()
    }

    fn is_pending(&self, ticket: Ticket) -> bool {
        self.pending == Some(ticket)
    }

    fn finish(&mut self, ticket: Ticket) -> bool {
        if !self.is_pending(ticket) {
            return false;
        }
        self.pending = None;
        self.loading = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str) -> GeneratedContent {
        GeneratedContent::Image { url: url.to_string() }
    }

    #[test]
    fn test_starts_idle() {
        let state = GenerationState::default();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_loading());
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut state = GenerationState::default();
        state.reject("Please upload an image to edit.");
        assert_eq!(state.phase(), Phase::Failed("Please upload an image to edit."));

        let ticket = state.begin(ToolType::ImageEditor, "Applying your edits...").unwrap();
        assert_eq!(state.phase(), Phase::Loading("Applying your edits..."));

        assert!(state.succeed(ticket, image("file:///out.png")));
        assert_eq!(state.phase(), Phase::Succeeded(&image("file:///out.png")));
    }

    #[test]
    fn test_failure_keeps_result_but_error_wins_display() {
        let mut state = GenerationState::default();
        let first = state.begin(ToolType::SceneBuilder, "Building your scene...").unwrap();
        state.succeed(first, image("file:///one.png"));

        let second = state.begin(ToolType::SceneBuilder, "Building your scene...").unwrap();
        state.fail(second, "quota exceeded");

        assert_eq!(state.phase(), Phase::Failed("quota exceeded"));
        assert_eq!(state.result(), Some(&image("file:///one.png")));
    }

    #[test]
    fn test_begin_refused_while_loading() {
        let mut state = GenerationState::default();
        let ticket = state.begin(ToolType::SceneBuilder, "Building your scene...");
        assert!(ticket.is_some());
        assert!(state.begin(ToolType::ImageEditor, "Applying your edits...").is_none());

        // Precondition errors do not interrupt the running request
        state.reject("Please upload an image to edit.");
        assert_eq!(state.phase(), Phase::Loading("Building your scene..."));
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut state = GenerationState::default();
        let stale = state.begin(ToolType::SceneBuilder, "Building your scene...").unwrap();
        state.fail(stale, "boom");

        let fresh = state.begin(ToolType::SceneBuilder, "Building your scene...").unwrap();
        assert!(!state.succeed(stale, image("file:///late.png")));
        assert!(!state.progress(stale, "late progress"));
        assert!(state.is_loading());

        assert!(state.succeed(fresh, image("file:///fresh.png")));
        assert_eq!(state.result(), Some(&image("file:///fresh.png")));
    }

    #[test]
    fn test_progress_updates_loading_message_in_place() {
        let mut state = GenerationState::default();
        let ticket = state.begin(ToolType::VideoGenerator, "Preparing video generation...").unwrap();

        assert!(state.progress(ticket, "Rendering frames..."));
        assert_eq!(state.phase(), Phase::Loading("Rendering frames..."));
        assert!(state.is_loading());
    }

    #[test]
    fn test_classify_entity_not_found_for_video() {
        let failure = classify_failure(
            ToolType::VideoGenerator,
            "404: Requested entity was not found. (status NOT_FOUND)",
        );
        assert_eq!(failure.message, KEY_RESELECT_MESSAGE);
        assert!(failure.reset_credentials);
    }

    #[test]
    fn test_classify_entity_not_found_only_special_for_video() {
        let failure = classify_failure(ToolType::SceneBuilder, "Requested entity was not found.");
        assert_eq!(failure.message, "Requested entity was not found.");
        assert!(!failure.reset_credentials);
    }

    #[test]
    fn test_classify_empty_message_uses_fallback() {
        assert_eq!(
            classify_failure(ToolType::SceneBuilder, "").message,
            "Failed to generate scene."
        );
        assert_eq!(
            classify_failure(ToolType::ImageEditor, "   ").message,
            "Failed to edit image."
        );
        assert_eq!(
            classify_failure(ToolType::VideoGenerator, "").message,
            "Failed to generate video."
        );
    }
}
