//! Localized response messages.
//!
//! English is the default; French is selected when `Accept-Language`
//! prefers `fr`.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Fr,
}

impl Lang {
    /// Picks the first supported language in the header, in listed order.
    ///
    /// Quality values are ignored; clients list their preferred language first.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()) else {
            return Lang::En;
        };
        value
            .split(',')
            .filter_map(|tag| {
                let primary = tag.split(';').next()?.trim().split('-').next()?;
                match primary.to_ascii_lowercase().as_str() {
                    "fr" => Some(Lang::Fr),
                    "en" => Some(Lang::En),
                    _ => None,
                }
            })
            .next()
            .unwrap_or_default()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Lang::from_headers(&parts.headers))
    }
}

/// Catalog keys for every message the API emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    UserDeleted,
    ProductDeleted,
    ReviewAdded,
    ReviewDeleted,

    Default,
    InvalidRequest,
    InvalidCredentials,
    NotAuthenticated,
    NotAdmin,
    Forbidden,
    NotFound,
    EmailTaken,
    AlreadyReviewed,
    UserHasRecords,
    Conflict,
    Unavailable,
}

impl Message {
    pub fn text(self, lang: Lang) -> &'static str {
        match lang {
            Lang::En => self.english(),
            Lang::Fr => self.french(),
        }
    }

    fn english(self) -> &'static str {
        match self {
            Message::UserDeleted => "User removed",
            Message::ProductDeleted => "Product removed",
            Message::ReviewAdded => "Review added",
            Message::ReviewDeleted => "Review removed",
            Message::Default => "An error occurred",
            Message::InvalidRequest => "Invalid request",
            Message::InvalidCredentials => "Invalid email or password",
            Message::NotAuthenticated => "Not authorized, no token",
            Message::NotAdmin => "Not authorized as an admin",
            Message::Forbidden => "You are not allowed to do this",
            Message::NotFound => "Resource not found",
            Message::EmailTaken => "User already exists",
            Message::AlreadyReviewed => "Product already reviewed",
            Message::UserHasRecords => "User still owns orders or products",
            Message::Conflict => "Conflicting request",
            Message::Unavailable => "Service temporarily unavailable",
        }
    }

    fn french(self) -> &'static str {
        match self {
            Message::UserDeleted => "L'utilisateur vient d'être supprimé.",
            Message::ProductDeleted => "Le produit vient d'être supprimé.",
            Message::ReviewAdded => "Avis ajouté avec succès.",
            Message::ReviewDeleted => "Avis supprimé.",
            Message::Default => "Une erreur s'est produite.",
            Message::InvalidRequest => "Requête invalide.",
            Message::InvalidCredentials => "L'adresse e-mail ou le mot de passe est invalide.",
            Message::NotAuthenticated => "Authentification requise.",
            Message::NotAdmin => "Accès réservé aux administrateurs.",
            Message::Forbidden => "Action non autorisée.",
            Message::NotFound => "Ressource introuvable.",
            Message::EmailTaken => {
                "L'adresse email saisie est déjà liée à un compte, veuillez vous connecter svp."
            }
            Message::AlreadyReviewed => "Vous avez déjà donné votre avis sur ce produit.",
            Message::UserHasRecords => {
                "Cet utilisateur possède encore des commandes ou des produits."
            }
            Message::Conflict => "La requête est en conflit avec l'état actuel.",
            Message::Unavailable => "Service momentanément indisponible.",
        }
    }
}
