use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::policy::RateLimitPolicy;

const AI_WINDOW: Duration = Duration::from_secs(2 * 60);
const AI_LOCKOUT: Duration = Duration::from_secs(2 * 60);

// Which identity a feature is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRule {
    GuestOnly, // not signed in yet
    UserOrGuest,
    UserOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Login,
    Register,
    PasswordResetRequest,
    PasswordReset,
    SendVerification,
    VerifyEmail,
    Summarize,
    GenerateContent,
    GenerateFlashcards,
    GenerateQuestions,
    Rephrase,
    FixGrammar,
    EditContent,
    Chat,
    DeleteContent,
    DeleteSummary,
}

impl Feature {
    pub const ALL: [Feature; 16] = [
        Feature::Login,
        Feature::Register,
        Feature::PasswordResetRequest,
        Feature::PasswordReset,
        Feature::SendVerification,
        Feature::VerifyEmail,
        Feature::Summarize,
        Feature::GenerateContent,
        Feature::GenerateFlashcards,
        Feature::GenerateQuestions,
        Feature::Rephrase,
        Feature::FixGrammar,
        Feature::EditContent,
        Feature::Chat,
        Feature::DeleteContent,
        Feature::DeleteSummary,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Feature::Login => "login",
            Feature::Register => "register",
            Feature::PasswordResetRequest => "password-reset-request",
            Feature::PasswordReset => "password-reset",
            Feature::SendVerification => "send-verification",
            Feature::VerifyEmail => "verify-email",
            Feature::Summarize => "summarize",
            Feature::GenerateContent => "generate-content",
            Feature::GenerateFlashcards => "generate-flashcards",
            Feature::GenerateQuestions => "generate-questions",
            Feature::Rephrase => "rephrase",
            Feature::FixGrammar => "fix-grammar",
            Feature::EditContent => "edit-content",
            Feature::Chat => "chat",
            Feature::DeleteContent => "delete-content",
            Feature::DeleteSummary => "delete-summary",
        }
    }

    // Features that call the generative backend
    pub fn is_ai(&self) -> bool {
        self.identity_rule() == IdentityRule::UserOrGuest
    }

    pub fn identity_rule(&self) -> IdentityRule {
        match self {
            Feature::Login
            | Feature::Register
            | Feature::PasswordResetRequest
            | Feature::PasswordReset
            | Feature::SendVerification
            | Feature::VerifyEmail => IdentityRule::GuestOnly,
            Feature::DeleteContent | Feature::DeleteSummary => IdentityRule::UserOnly,
            _ => IdentityRule::UserOrGuest,
        }
    }

    // None means the controller default
    pub fn policy(&self) -> Option<RateLimitPolicy> {
        match self {
            Feature::GenerateContent | Feature::GenerateFlashcards | Feature::GenerateQuestions => {
                Some(RateLimitPolicy::new(AI_WINDOW, 3, AI_LOCKOUT))
            }
            Feature::Summarize
            | Feature::Rephrase
            | Feature::FixGrammar
            | Feature::EditContent
            | Feature::Chat => Some(RateLimitPolicy::new(AI_WINDOW, 5, AI_LOCKOUT)),
            _ => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.slug() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}
