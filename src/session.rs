use uuid::Uuid;

use crate::error::{InsightsError, Result};

pub const ACTOR_ENV: &str = "EHRDC_ACTOR_ID";

/// Identity of the user performing writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Uuid,
}

impl ActorContext {
    pub fn parse(raw: &str) -> Result<Self> {
        let user_id =
            Uuid::parse_str(raw.trim()).map_err(|_| InsightsError::InvalidActor(raw.to_string()))?;
        Ok(Self { user_id })
    }
}

/// Raw actor id captured at start-up. Parsed only when a write asks for it,
/// so read-only commands never fail on a bad value.
#[derive(Debug, Clone, Default)]
pub struct ActorSource {
    raw: Option<String>,
}

impl ActorSource {
    /// Flag value wins over the environment.
    pub fn new(flag: Option<String>, env: Option<String>) -> Self {
        let raw = flag
            .or(env)
            .filter(|value| !value.trim().is_empty());
        Self { raw }
    }

    pub fn from_env(flag: Option<String>) -> Self {
        Self::new(flag, std::env::var(ACTOR_ENV).ok())
    }

    pub fn require(&self) -> Result<ActorContext> {
        match self.raw.as_deref() {
            Some(raw) => ActorContext::parse(raw),
            None => Err(InsightsError::MissingActor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";
    const OTHER: &str = "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc";

    #[test]
    fn flag_takes_precedence_over_env() {
        let source = ActorSource::new(Some(ID.to_string()), Some(OTHER.to_string()));
        assert_eq!(source.require().unwrap().user_id.to_string(), ID);
    }

    #[test]
    fn falls_back_to_env() {
        let source = ActorSource::new(None, Some(OTHER.to_string()));
        assert_eq!(source.require().unwrap().user_id.to_string(), OTHER);

        let blank = ActorSource::new(None, Some("  ".to_string()));
        assert!(matches!(blank.require(), Err(InsightsError::MissingActor)));
    }

    #[test]
    fn writes_need_an_actor() {
        assert!(matches!(
            ActorSource::default().require(),
            Err(InsightsError::MissingActor)
        ));
    }

    #[test]
    fn malformed_id_only_fails_when_required() {
        let source = ActorSource::new(None, Some("not-a-uuid".to_string()));
        assert!(matches!(
            source.require(),
            Err(InsightsError::InvalidActor(raw)) if raw == "not-a-uuid"
        ));
    }
}
