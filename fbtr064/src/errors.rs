//! Gestion des erreurs pour le client TR-064

use thiserror::Error;

/// Résultat d'un appel d'action : données extraites ou erreur
pub type CallResult = std::result::Result<crate::model::DeviceData, Tr064Error>;

/// Erreurs possibles lors d'un appel d'action TR-064
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Tr064Error {
    /// Connexion refusée, DNS, timeout, erreur de socket ou corps trop long
    #[error("Transport error: {0}")]
    Transport(String),

    /// Challenge digest incomplet ou non supporté
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Balise absente ou valeur non convertible dans la réponse
    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl Tr064Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Tr064Error::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Tr064Error::Protocol(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Tr064Error::Extraction(message.into())
    }

    /// Libellé court utilisé dans les logs
    pub fn kind(&self) -> &'static str {
        match self {
            Tr064Error::Transport(_) => "transport",
            Tr064Error::Protocol(_) => "protocol",
            Tr064Error::Extraction(_) => "extraction",
        }
    }
}
