//! Shared hover/selection state of the token grid and the piano roll.
//!
//! Both views read this state; only the coordinator mutates it, through
//! [`SelectionState::apply`]. Every transition that touches one side also
//! resolves and stores its counterpart on the other side, so the pair can
//! never disagree.

use super::xref::{
    note_at, note_key, resolve_note_from_token, resolve_token_from_note, token_at, token_key,
    CorrelationKey, NoteRef, TokenRef,
};
use crate::midi::{LoadedResponse, NoteId};

/// A hovered or selected element together with its correlation key.
///
/// The key is resolved once when the state changes so that per-frame
/// highlight checks are plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus<R> {
    pub item: R,
    pub key: Option<CorrelationKey>,
}

/// User interaction reported by either view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    HoverToken(Option<TokenRef>),
    SelectToken(Option<TokenRef>),
    HoverNote(Option<NoteRef>),
    SelectNote(Option<NoteRef>),
    /// Drops every hover and selection, e.g. when responses are added or closed.
    Clear,
}

/// Highlight inputs of one rendered element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementFlags {
    pub highlighted: bool,
    pub selected: bool,
}

/// Current hover and selection of both views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    hovered_token: Option<Focus<TokenRef>>,
    selected_token: Option<Focus<TokenRef>>,
    hovered_note: Option<Focus<NoteRef>>,
    selected_note: Option<Focus<NoteRef>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered_token(&self) -> Option<TokenRef> {
        self.hovered_token.map(|f| f.item)
    }

    pub fn selected_token(&self) -> Option<TokenRef> {
        self.selected_token.map(|f| f.item)
    }

    pub fn hovered_note(&self) -> Option<NoteRef> {
        self.hovered_note.map(|f| f.item)
    }

    pub fn selected_note(&self) -> Option<NoteRef> {
        self.selected_note.map(|f| f.item)
    }

    /// Returns true if nothing is hovered or selected.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies one interaction event.
    ///
    /// Hovering or selecting a token also resolves the note it encodes (and
    /// vice versa) and stores both in the same step. When no counterpart
    /// exists the other side is cleared. Handles that no longer point at a
    /// loaded element are treated as `None`.
    ///
    /// # Returns
    ///
    /// true if the state changed
    pub fn apply(&mut self, event: SelectionEvent, responses: &[LoadedResponse]) -> bool {
        let before = self.clone();

        match event {
            SelectionEvent::HoverToken(token) => {
                let (token, note) = token_pair(token, responses);
                self.hovered_token = token;
                self.hovered_note = note;
            }
            SelectionEvent::SelectToken(token) => {
                let (token, note) = token_pair(token, responses);
                self.selected_token = token;
                self.selected_note = note;
            }
            SelectionEvent::HoverNote(note) => {
                let (note, token) = note_pair(note, responses);
                self.hovered_note = note;
                self.hovered_token = token;
            }
            SelectionEvent::SelectNote(note) => {
                let (note, token) = note_pair(note, responses);
                self.selected_note = note;
                self.selected_token = token;
            }
            SelectionEvent::Clear => *self = Self::default(),
        }

        let changed = *self != before;
        if changed {
            tracing::debug!("Selection changed by {:?}", event);
        }
        changed
    }

    /// Evaluates the highlight inputs of a token block.
    ///
    /// A token is highlighted when it is the hovered token itself, or when it
    /// encodes the hovered note. Likewise for selection.
    pub fn token_flags(&self, token: TokenRef, note_id: Option<NoteId>) -> ElementFlags {
        let key = note_id.map(|id| (token.response, id));
        ElementFlags {
            highlighted: self.hovered_token.is_some_and(|f| f.item == token)
                || key_matches(key, self.hovered_token.and_then(|f| f.key))
                || key_matches(key, self.hovered_note.and_then(|f| f.key)),
            selected: self.selected_token.is_some_and(|f| f.item == token)
                || key_matches(key, self.selected_token.and_then(|f| f.key))
                || key_matches(key, self.selected_note.and_then(|f| f.key)),
        }
    }

    /// Evaluates the highlight inputs of a piano roll note.
    pub fn note_flags(&self, note: NoteRef, note_id: NoteId) -> ElementFlags {
        let key = Some((note.response, note_id));
        ElementFlags {
            highlighted: self.hovered_note.is_some_and(|f| f.item == note)
                || key_matches(key, self.hovered_note.and_then(|f| f.key))
                || key_matches(key, self.hovered_token.and_then(|f| f.key)),
            selected: self.selected_note.is_some_and(|f| f.item == note)
                || key_matches(key, self.selected_note.and_then(|f| f.key))
                || key_matches(key, self.selected_token.and_then(|f| f.key)),
        }
    }
}

/// Both keys present and equal. Absent keys never match.
fn key_matches(a: Option<CorrelationKey>, b: Option<CorrelationKey>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

type TokenFocus = Option<Focus<TokenRef>>;
type NoteFocus = Option<Focus<NoteRef>>;

fn token_pair(token: Option<TokenRef>, responses: &[LoadedResponse]) -> (TokenFocus, NoteFocus) {
    let Some(item) = token else {
        return (None, None);
    };
    let Some(resolved) = token_at(responses, item) else {
        return (None, None);
    };

    let note = resolve_note_from_token(item.response, resolved, responses).map(|n| Focus {
        item: n,
        key: note_key(responses, n),
    });
    let token = Focus {
        item,
        key: token_key(responses, item),
    };
    (Some(token), note)
}

fn note_pair(note: Option<NoteRef>, responses: &[LoadedResponse]) -> (NoteFocus, TokenFocus) {
    let Some(item) = note else {
        return (None, None);
    };
    let Some(resolved) = note_at(responses, item) else {
        return (None, None);
    };

    let token = resolve_token_from_note(item.response, resolved, responses).map(|t| Focus {
        item: t,
        key: token_key(responses, t),
    });
    let note = Focus {
        item,
        key: note_key(responses, item),
    };
    (Some(note), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::ResponseId;
    use crate::viz::xref::tests::fixture;

    #[test]
    fn test_select_note_sets_matching_token() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        assert!(state.apply(SelectionEvent::SelectNote(Some(NoteRef::new(id, 0, 0))), &responses));
        assert_eq!(state.selected_note(), Some(NoteRef::new(id, 0, 0)));
        assert_eq!(state.selected_token(), Some(TokenRef::new(id, 1)));
    }

    #[test]
    fn test_select_unmatched_note_clears_token() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectToken(Some(TokenRef::new(id, 1))), &responses);
        assert!(state.selected_note().is_some());

        // Note 3 has no token.
        state.apply(SelectionEvent::SelectNote(Some(NoteRef::new(id, 1, 0))), &responses);
        assert_eq!(state.selected_note(), Some(NoteRef::new(id, 1, 0)));
        assert_eq!(state.selected_token(), None);
    }

    #[test]
    fn test_select_token_without_note_clears_note() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectNote(Some(NoteRef::new(id, 0, 0))), &responses);
        state.apply(SelectionEvent::SelectToken(Some(TokenRef::new(id, 0))), &responses);
        assert_eq!(state.selected_token(), Some(TokenRef::new(id, 0)));
        assert_eq!(state.selected_note(), None);
    }

    #[test]
    fn test_deselect_clears_both_sides() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectToken(Some(TokenRef::new(id, 4))), &responses);
        state.apply(SelectionEvent::SelectToken(None), &responses);
        assert!(state.is_empty());
    }

    #[test]
    fn test_hover_propagates_to_every_token_of_the_note() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::HoverNote(Some(NoteRef::new(id, 0, 0))), &responses);
        let pitch = responses[0].token(1).and_then(|t| t.note_id);
        let velocity = responses[0].token(2).and_then(|t| t.note_id);
        assert!(state.token_flags(TokenRef::new(id, 1), pitch).highlighted);
        assert!(state.token_flags(TokenRef::new(id, 2), velocity).highlighted);
        assert!(!state.token_flags(TokenRef::new(id, 0), None).highlighted);
        assert!(!state.token_flags(TokenRef::new(id, 1), pitch).selected);
    }

    #[test]
    fn test_hovered_token_without_note_highlights_only_itself() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::HoverToken(Some(TokenRef::new(id, 0))), &responses);
        assert!(state.token_flags(TokenRef::new(id, 0), None).highlighted);
        assert!(!state.token_flags(TokenRef::new(id, 3), None).highlighted);
        assert_eq!(state.hovered_note(), None);
    }

    #[test]
    fn test_token_selection_marks_note() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectToken(Some(TokenRef::new(id, 2))), &responses);
        let flags = state.note_flags(NoteRef::new(id, 0, 0), NoteId::new(1));
        assert!(flags.selected);
        assert!(!flags.highlighted);
    }

    #[test]
    fn test_equal_note_ids_in_other_response_stay_dark() {
        let responses = vec![fixture("a"), fixture("b")];
        let (a, b) = (responses[0].id(), responses[1].id());
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectNote(Some(NoteRef::new(a, 0, 0))), &responses);
        assert_eq!(state.selected_token().map(|t| t.response), Some(a));
        assert!(!state.note_flags(NoteRef::new(b, 0, 0), NoteId::new(1)).selected);
        assert!(!state.token_flags(TokenRef::new(b, 1), Some(NoteId::new(1))).selected);
    }

    #[test]
    fn test_stale_handles_are_ignored() {
        let responses = vec![fixture("a")];
        let mut state = SelectionState::new();

        let stale = TokenRef::new(ResponseId::new(), 1);
        assert!(!state.apply(SelectionEvent::SelectToken(Some(stale)), &responses));
        assert!(state.is_empty());

        let out_of_range = NoteRef::new(responses[0].id(), 0, 99);
        state.apply(SelectionEvent::HoverNote(Some(out_of_range)), &responses);
        assert!(state.is_empty());
    }

    #[test]
    fn test_clear_drops_focus_in_every_response() {
        let responses = vec![fixture("a"), fixture("b")];
        let (a, b) = (responses[0].id(), responses[1].id());
        let mut state = SelectionState::new();

        state.apply(SelectionEvent::SelectNote(Some(NoteRef::new(a, 0, 0))), &responses);
        state.apply(SelectionEvent::HoverToken(Some(TokenRef::new(b, 4))), &responses);
        assert!(!state.is_empty());

        assert!(state.apply(SelectionEvent::Clear, &responses));
        assert!(state.is_empty());
        assert!(!state.apply(SelectionEvent::Clear, &responses));
    }
}
