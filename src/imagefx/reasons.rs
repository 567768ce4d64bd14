//! Vendor failure codes and their localized user messages.
//!
//! The vendor reports moderation and processing problems through an opaque
//! `reason` string; everything the UI shows is driven by two static tables:
//! reason → failure code, and failure code → Spanish user message.

// Author: kelexine (https://github.com/kelexine)

use phf::phf_map;

/// Typed failure surfaced by the ImageFX client.
///
/// `code()` yields the stable string key used for logging, metrics and the
/// user-message table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    // Upload moderation
    MinorUpload,
    ProminentPeopleUpload,
    ChildExploitationUpload,
    HarmfulContentUpload,
    GenericUpload,
    ImageTooLarge,
    NoMediaIds,
    NoImageProvided,

    // Generation moderation
    UnsafeGeneration,
    Minors,
    Sexual,
    Violence,
    Criminal,

    // Generation outcome
    NoImagesReturned,
    InvalidJson,
    NonJsonError,
    GenericApi(Option<String>),

    // Transport and configuration
    Auth(String),
    Timeout,
    Connection(String),
    InternalConfig,
}

impl ApiFailure {
    /// Stable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiFailure::MinorUpload => "minor_upload_error",
            ApiFailure::ProminentPeopleUpload => "prominent_people_error",
            ApiFailure::ChildExploitationUpload => "child_exploitation_error",
            ApiFailure::HarmfulContentUpload => "harmful_content_error",
            ApiFailure::GenericUpload => "generic_upload_error",
            ApiFailure::ImageTooLarge => "image_too_large",
            ApiFailure::NoMediaIds => "upload_failed: no_media_ids",
            ApiFailure::NoImageProvided => "no_image_provided",
            ApiFailure::UnsafeGeneration => "unsafe_generation_error",
            ApiFailure::Minors => "minors_error",
            ApiFailure::Sexual => "sexual_error",
            ApiFailure::Violence => "violence_error",
            ApiFailure::Criminal => "criminal_error",
            ApiFailure::NoImagesReturned => "no_images_returned",
            ApiFailure::InvalidJson => "generic_api_error: invalid_json",
            ApiFailure::NonJsonError => "generic_api_error: non_json_error_response",
            ApiFailure::GenericApi(_) => "generic_api_error",
            ApiFailure::Auth(_) => "auth_error",
            ApiFailure::Timeout => "connection_error: timeout",
            ApiFailure::Connection(_) => "connection_error",
            ApiFailure::InternalConfig => "internal_config_error",
        }
    }

    /// Localized message shown to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            ApiFailure::Auth(detail) => format!(
                "{} Detalles: {}",
                lookup_message("auth_error"),
                detail
            ),
            other => lookup_message(other.code()).to_string(),
        }
    }
}

// Display mirrors the internal message strings the original codes produced,
// with transport/detail suffixes where present. Used for logs only.
impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiFailure::Auth(detail) => write!(f, "auth_error: {}", detail),
            ApiFailure::Connection(detail) => write!(f, "connection_error: {}", detail),
            ApiFailure::GenericApi(Some(detail)) => write!(f, "generic_api_error: {}", detail),
            other => f.write_str(other.code()),
        }
    }
}

/// Upload moderation reasons reported by `uploadUserImage`.
static UPLOAD_REASONS: phf::Map<&'static str, ApiFailure> = phf_map! {
    "PUBLIC_ERROR_MINOR_UPLOAD" => ApiFailure::MinorUpload,
    "PUBLIC_ERROR_PROMINENT_PEOPLE_UPLOAD" => ApiFailure::ProminentPeopleUpload,
    "PUBLIC_ERROR_CHILD_EXPLOITATION_UPLOAD" => ApiFailure::ChildExploitationUpload,
    "PUBLIC_ERROR_HARMFUL_CONTENT_UPLOAD" => ApiFailure::HarmfulContentUpload,
};

/// Generation moderation reasons reported by `runImageFx`.
static GENERATION_REASONS: phf::Map<&'static str, ApiFailure> = phf_map! {
    "PUBLIC_ERROR_UNSAFE_GENERATION" => ApiFailure::UnsafeGeneration,
    "PUBLIC_ERROR_MINORS" => ApiFailure::Minors,
    "PUBLIC_ERROR_SEXUAL" => ApiFailure::Sexual,
    "PUBLIC_ERROR_VIOLENCE" => ApiFailure::Violence,
    "PUBLIC_ERROR_CRIMINAL" => ApiFailure::Criminal,
};

const GENERIC_API_MESSAGE: &str =
    "La IA devolvió un error interno. Intenta de nuevo o con un prompt/imagen diferente.";

/// Failure code → localized user message.
static USER_MESSAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "minor_upload_error" => "La imagen de referencia podría contener contenido inapropiado (ej. menores, contenido explícito). Por favor, usa otra imagen.",
    "prominent_people_error" => "La imagen de referencia contiene personas prominentes o contenido sensible. Por favor, usa otra imagen.",
    "child_exploitation_error" => "Contenido de explotación infantil detectado en la imagen de referencia. Esta acción está estrictamente prohibida.",
    "harmful_content_error" => "La imagen de referencia contiene contenido dañino. Por favor, usa otra imagen.",
    "generic_upload_error" => "Error al procesar la imagen de referencia. Asegúrate de que sea una imagen válida y no esté dañada.",
    "image_too_large" => "La imagen de referencia es demasiado grande. El tamaño máximo permitido es 10MB.",
    "upload_failed: no_media_ids" => "Fallo interno: No se pudieron subir las imágenes de referencia. Intenta de nuevo.",
    "no_image_provided" => "No se proporcionó ninguna imagen para subir. Esto es un error interno.",
    "unsafe_generation_error" => "Tu descripción infringe las políticas de contenido seguro (ej. menores, contenido explícito, violento). Por favor, modifica tu prompt.",
    "minors_error" => "Contenido relacionado con menores o de naturaleza sensible en la descripción. Por favor, ajusta tu prompt.",
    "sexual_error" => "Contenido de naturaleza sexual en la descripción. Por favor, ajusta tu prompt.",
    "violence_error" => "Contenido violento o gráfico en la descripción. Por favor, ajusta tu prompt.",
    "criminal_error" => "Contenido relacionado con actividades criminales en la descripción. Por favor, ajusta tu prompt.",
    "no_images_returned" => "La IA no pudo generar imágenes para tu descripción. Intenta con un prompt diferente.",
    "auth_error" => "Error de autenticación: Tu sesión ha caducado o es inválida. Vuelve a cargar la página e inténtalo de nuevo.",
    "connection_error: timeout" => "La conexión con la IA se agotó (timeout). Revisa tu conexión a internet o intenta más tarde.",
    "connection_error" => "Error de conexión con el servidor de IA. Revisa tu conexión a internet e inténtalo de nuevo.",
    "generic_api_error: invalid_json" => "La respuesta de la IA no es válida. Intenta de nuevo.",
    "generic_api_error: non_json_error_response" => "La IA devolvió un error inesperado en el formato. Intenta de nuevo.",
    "internal_config_error" => "Error de configuración interna de la aplicación. Por favor, contacta al soporte.",
    "generic_api_error" => GENERIC_API_MESSAGE,
};

fn lookup_message(code: &str) -> &'static str {
    USER_MESSAGES.get(code).copied().unwrap_or(GENERIC_API_MESSAGE)
}

/// Map an upload moderation reason to a failure; unknown reasons degrade to
/// the generic upload failure.
pub fn from_upload_reason(reason: &str) -> ApiFailure {
    UPLOAD_REASONS
        .get(reason)
        .cloned()
        .unwrap_or(ApiFailure::GenericUpload)
}

/// Map a generation moderation reason to a failure; unknown reasons degrade
/// to the generic API failure.
pub fn from_generation_reason(reason: &str) -> ApiFailure {
    GENERATION_REASONS
        .get(reason)
        .cloned()
        .unwrap_or(ApiFailure::GenericApi(None))
}
