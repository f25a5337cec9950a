//! Note/token cross-referencing.
//!
//! A token and a note correspond when they share a `note_id` within the same
//! response. Lookups are plain linear scans over the loaded responses; token
//! and note counts per file are small enough that no index is kept.

use crate::midi::{LoadedResponse, Note, NoteId, ResponseId, Token};

/// Positional handle to a token: its index in the response's flattened stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenRef {
    pub response: ResponseId,
    pub index: usize,
}

impl TokenRef {
    pub fn new(response: ResponseId, index: usize) -> Self {
        Self { response, index }
    }
}

/// Positional handle to a note: its track and position within the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteRef {
    pub response: ResponseId,
    pub track: usize,
    pub index: usize,
}

impl NoteRef {
    pub fn new(response: ResponseId, track: usize, index: usize) -> Self {
        Self {
            response,
            track,
            index,
        }
    }
}

/// Cross-reference key: a note id scoped to the response that defines it.
pub type CorrelationKey = (ResponseId, NoteId);

/// Finds the response a handle points into.
pub fn find_response(responses: &[LoadedResponse], id: ResponseId) -> Option<&LoadedResponse> {
    responses.iter().find(|r| r.id() == id)
}

/// Dereferences a token handle.
pub fn token_at(responses: &[LoadedResponse], token: TokenRef) -> Option<&Token> {
    find_response(responses, token.response)?.token(token.index)
}

/// Dereferences a note handle.
pub fn note_at(responses: &[LoadedResponse], note: NoteRef) -> Option<&Note> {
    find_response(responses, note.response)?.note(note.track, note.index)
}

/// Returns the correlation key of a token, or None if it encodes no note.
pub fn token_key(responses: &[LoadedResponse], token: TokenRef) -> Option<CorrelationKey> {
    let note_id = token_at(responses, token)?.note_id?;
    Some((token.response, note_id))
}

/// Returns the correlation key of a note.
pub fn note_key(responses: &[LoadedResponse], note: NoteRef) -> Option<CorrelationKey> {
    let note_id = note_at(responses, note)?.note_id;
    Some((note.response, note_id))
}

/// Finds the first token encoding the given note.
///
/// Scans the flattened token streams of the loaded responses in order and
/// matches on `(response, note_id)`, so a note never resolves to a token of
/// another file. Returns None when no token carries the note's id.
pub fn resolve_token_from_note(
    response: ResponseId,
    note: &Note,
    responses: &[LoadedResponse],
) -> Option<TokenRef> {
    responses
        .iter()
        .filter(|r| r.id() == response)
        .find_map(|r| {
            r.tokens()
                .iter()
                .position(|t| t.note_id == Some(note.note_id))
                .map(|index| TokenRef::new(r.id(), index))
        })
}

/// Finds the note a token encodes.
///
/// Tokens without a `note_id` never resolve. Otherwise every track of the
/// token's own response is scanned for the matching note.
pub fn resolve_note_from_token(
    response: ResponseId,
    token: &Token,
    responses: &[LoadedResponse],
) -> Option<NoteRef> {
    let note_id = token.note_id?;

    responses
        .iter()
        .filter(|r| r.id() == response)
        .find_map(|r| {
            r.tracks().iter().enumerate().find_map(|(track, notes)| {
                notes
                    .iter()
                    .position(|n| n.note_id == note_id)
                    .map(|index| NoteRef::new(r.id(), track, index))
            })
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::midi::{ResponseData, TokenPayload, TokenType};
    use crate::viz::flatten::TokenNode;

    /// Two tracks, five tokens. Note 1 is encoded by a pitch and a velocity
    /// token, note 2 by a pitch token, note 3 by none.
    pub(crate) fn fixture(name: &str) -> LoadedResponse {
        let tok = |kind: TokenType, value: &str, note_id: Option<u64>| {
            TokenNode::Leaf(Token::new(kind, value, 0.0, note_id))
        };
        let data = ResponseData {
            tokens: TokenPayload::Nodes(vec![
                TokenNode::Group(vec![
                    tok(TokenType::Bar, "None", None),
                    tok(TokenType::Pitch, "60", Some(1)),
                    tok(TokenType::Velocity, "100", Some(1)),
                ]),
                TokenNode::Group(vec![
                    tok(TokenType::Position, "4", None),
                    tok(TokenType::Pitch, "72", Some(2)),
                ]),
            ]),
            notes: vec![
                vec![Note::new(1, 60, 10.0, 20.0, 100.0)],
                vec![
                    Note::new(3, 48, 0.0, 5.0, 80.0),
                    Note::new(2, 72, 40.0, 80.0, 90.0),
                ],
            ],
            metrics: Default::default(),
        };
        LoadedResponse::new(name, data)
    }

    #[test]
    fn test_cross_reference_symmetry() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();

        let note = NoteRef::new(id, 1, 1);
        let token = resolve_token_from_note(id, note_at(&responses, note).unwrap(), &responses);
        assert_eq!(token, Some(TokenRef::new(id, 4)));

        let back = resolve_note_from_token(
            id,
            token_at(&responses, token.unwrap()).unwrap(),
            &responses,
        );
        assert_eq!(back, Some(note));
    }

    #[test]
    fn test_first_matching_token_wins() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        let note = note_at(&responses, NoteRef::new(id, 0, 0)).unwrap();
        // Pitch (index 1) comes before Velocity (index 2).
        assert_eq!(
            resolve_token_from_note(id, note, &responses),
            Some(TokenRef::new(id, 1))
        );

        let velocity = token_at(&responses, TokenRef::new(id, 2)).unwrap();
        assert_eq!(
            resolve_note_from_token(id, velocity, &responses),
            Some(NoteRef::new(id, 0, 0))
        );
    }

    #[test]
    fn test_unmatched_lookups_resolve_to_none() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();

        let orphan = note_at(&responses, NoteRef::new(id, 1, 0)).unwrap();
        assert_eq!(resolve_token_from_note(id, orphan, &responses), None);

        let bar = token_at(&responses, TokenRef::new(id, 0)).unwrap();
        assert_eq!(resolve_note_from_token(id, bar, &responses), None);
    }

    #[test]
    fn test_lookups_are_scoped_to_their_response() {
        let responses = vec![fixture("a"), fixture("b")];
        let (a, b) = (responses[0].id(), responses[1].id());

        let note_in_b = note_at(&responses, NoteRef::new(b, 0, 0)).unwrap();
        let token = resolve_token_from_note(b, note_in_b, &responses).unwrap();
        assert_eq!(token.response, b);

        let token_in_a = token_at(&responses, TokenRef::new(a, 1)).unwrap();
        let note = resolve_note_from_token(a, token_in_a, &responses).unwrap();
        assert_eq!(note.response, a);
    }

    #[test]
    fn test_unknown_response_resolves_to_none() {
        let responses = vec![fixture("a")];
        let note = Note::new(1, 60, 10.0, 20.0, 100.0);
        assert_eq!(
            resolve_token_from_note(ResponseId::new(), &note, &responses),
            None
        );
    }

    #[test]
    fn test_keys() {
        let responses = vec![fixture("a")];
        let id = responses[0].id();
        assert_eq!(token_key(&responses, TokenRef::new(id, 0)), None);
        assert_eq!(
            token_key(&responses, TokenRef::new(id, 2)),
            Some((id, NoteId::new(1)))
        );
        assert_eq!(
            note_key(&responses, NoteRef::new(id, 1, 1)),
            Some((id, NoteId::new(2)))
        );
        assert_eq!(note_key(&responses, NoteRef::new(id, 9, 0)), None);
    }
}
