//! Per-browser form state and the display reducer for generation results.
//!
//! Sessions live in memory only. A session allows one generation at a time:
//! `begin_generation` refuses while the loading flag is set, so a slow call
//! can never land on top of a newer one.

use std::collections::HashMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    gemini::LayoutError,
    models::{HomeSpecifications, LayoutRequest, LayoutSlot, SessionView, SpecField, Theme},
    validation::ValidationErrors,
};

pub const FALLBACK_CAPTION: &str = "Could not generate a layout. Please try again.";

/// The single result slot plus the loading flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    pub layout: LayoutSlot,
    pub error: Option<String>,
    pub loading: bool,
}

impl LayoutResult {
    pub fn begin(&mut self) {
        self.error = None;
        self.layout = LayoutSlot::Empty;
        self.loading = true;
    }

    pub fn succeed(&mut self, image_uri: String) {
        self.layout = LayoutSlot::Image(image_uri);
        self.loading = false;
    }

    pub fn fail(&mut self, err: &LayoutError) {
        self.error = Some(format!("Failed to generate layout: {}", err));
        self.layout = LayoutSlot::Fallback(FALLBACK_CAPTION.to_string());
        self.loading = false;
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub vision: String,
    pub other_features: String,
    specifications: HomeSpecifications,
    errors: ValidationErrors,
    pub theme: Theme,
    pub result: LayoutResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let specifications = HomeSpecifications::default();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vision: String::new(),
            other_features: String::new(),
            errors: ValidationErrors::for_specifications(&specifications),
            specifications,
            theme: Theme::default(),
            result: LayoutResult::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn specifications(&self) -> &HomeSpecifications {
        &self.specifications
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Sets one field and revalidates that field only.
    pub fn update_field(&mut self, field: SpecField, value: String) -> Result<(), AppError> {
        self.specifications.set(field, value).map_err(AppError::InvalidInput)?;
        self.errors.revalidate(field, self.specifications.get(field));
        self.touch();
        Ok(())
    }

    /// Replaces the whole record and revalidates all ten fields.
    pub fn replace_specifications(&mut self, specifications: HomeSpecifications) {
        self.errors = ValidationErrors::for_specifications(&specifications);
        self.specifications = specifications;
        self.touch();
    }

    pub fn can_generate(&self) -> bool {
        !self.result.loading && !self.errors.has_errors()
    }

    /// Starts a generation: checks the gate, resets the slot and snapshots the request.
    pub fn begin_generation(&mut self) -> Result<LayoutRequest, AppError> {
        if self.result.loading {
            return Err(AppError::GenerationInFlight);
        }
        if self.errors.has_errors() {
            return Err(AppError::HasValidationErrors);
        }
        self.result.begin();
        self.touch();
        Ok(LayoutRequest {
            vision: self.vision.clone(),
            specifications: self.specifications.clone(),
            other_features: self.other_features.clone(),
        })
    }

    pub fn finish_generation(&mut self, outcome: Result<String, LayoutError>) {
        match outcome {
            Ok(uri) => self.result.succeed(uri),
            Err(e) => self.result.fail(&e),
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn view(&self, api_key_set: bool) -> SessionView {
        SessionView {
            id: self.id,
            vision: self.vision.clone(),
            other_features: self.other_features.clone(),
            specifications: self.specifications().clone(),
            errors: self.errors().clone(),
            has_errors: self.errors.has_errors(),
            theme: self.theme,
            layout: self.result.layout.clone(),
            error: self.result.error.clone(),
            loading: self.result.loading,
            can_generate: self.can_generate(),
            api_key_set,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn create(&self) -> Session {
        let session = Session::new();
        self.sessions.write().insert(session.id, session.clone());
        session
    }

    pub fn get(&self, id: Uuid) -> Result<Session, AppError> {
        self.sessions.read().get(&id).cloned().ok_or(AppError::SessionNotFound(id))
    }

    /// Runs `f` against the stored session under the write lock.
    pub fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> Result<T, AppError>) -> Result<T, AppError> {
        let mut guard = self.sessions.write();
        let session = guard.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        f(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Choice;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_session_has_defaults_and_no_errors() {
        let session = Session::new();
        assert_eq!(session.specifications(), &HomeSpecifications::default());
        assert!(!session.errors().has_errors());
        assert!(session.can_generate());
        assert_eq!(session.theme, Theme::Dark);
        assert_eq!(session.result, LayoutResult::default());
    }

    #[test]
    fn field_update_revalidates_that_field() {
        let mut session = Session::new();
        session.update_field(SpecField::CeilingHeight, "0".into()).unwrap();
        assert_eq!(session.errors().get(SpecField::CeilingHeight).map(|e| e.to_string()), Some("Must be positive".into()));
        assert!(!session.can_generate());

        session.update_field(SpecField::CeilingHeight, "9".into()).unwrap();
        assert!(session.can_generate());
    }

    #[test]
    fn choice_fields_reject_other_values() {
        let mut session = Session::new();
        let err = session.update_field(SpecField::Garden, "Maybe".into()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(session.specifications().garden, Choice::No);

        session.update_field(SpecField::Garden, "Yes".into()).unwrap();
        assert_eq!(session.specifications().garden, Choice::Yes);
    }

    #[test]
    fn replacing_specifications_bulk_validates() {
        let mut session = Session::new();
        session.replace_specifications(HomeSpecifications {
            total_area: "".into(),
            balconies: "-1".into(),
            ..HomeSpecifications::default()
        });
        assert!(session.errors().get(SpecField::TotalArea).is_some());
        assert!(session.errors().get(SpecField::Balconies).is_some());
        assert!(session.errors().get(SpecField::CeilingHeight).is_none());
    }

    #[test]
    fn reducer_clears_then_stores_success() {
        let mut result = LayoutResult {
            layout: LayoutSlot::Fallback(FALLBACK_CAPTION.into()),
            error: Some("old".into()),
            loading: false,
        };
        result.begin();
        assert_eq!(result, LayoutResult { layout: LayoutSlot::Empty, error: None, loading: true });

        result.succeed("data:image/png;base64,AAAA".into());
        assert_eq!(result, LayoutResult {
            layout: LayoutSlot::Image("data:image/png;base64,AAAA".into()),
            error: None,
            loading: false,
        });
    }

    #[test]
    fn reducer_failure_sets_message_and_caption() {
        let mut result = LayoutResult::default();
        result.begin();
        result.fail(&LayoutError::Unknown);
        assert_eq!(result.error.as_deref(), Some("Failed to generate layout: An unknown error occurred while communicating with the Gemini API."));
        assert_eq!(result.layout, LayoutSlot::Fallback("Could not generate a layout. Please try again.".into()));
        assert!(!result.loading);
    }

    #[test]
    fn generation_is_single_flight() {
        let mut session = Session::new();
        session.vision = "courtyard house".into();
        let request = session.begin_generation().unwrap();
        assert_eq!(request.vision, "courtyard house");
        assert!(session.result.loading);
        assert!(matches!(session.begin_generation(), Err(AppError::GenerationInFlight)));

        session.finish_generation(Ok("data:image/png;base64,AAAA".into()));
        assert!(session.begin_generation().is_ok());
    }

    #[test]
    fn generation_blocked_by_validation_errors() {
        let mut session = Session::new();
        session.update_field(SpecField::TotalArea, "abc".into()).unwrap();
        assert!(matches!(session.begin_generation(), Err(AppError::HasValidationErrors)));
        assert!(!session.result.loading);
    }

    #[test]
    fn store_update_and_missing_sessions() {
        let store = SessionStore::default();
        let id = store.create().id;
        store.update(id, |s| { s.other_features = "pool".into(); Ok(()) }).unwrap();
        assert_eq!(store.get(id).unwrap().other_features, "pool");

        let missing = Uuid::new_v4();
        assert!(matches!(store.get(missing), Err(AppError::SessionNotFound(m)) if m == missing));
    }
}
