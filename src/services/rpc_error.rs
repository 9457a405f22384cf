// ============================================================================
// RPC ERROR - Forma estructurada única para errores de transporte
// ============================================================================
// Todo error RPC se normaliza ACA, en el borde del transporte. Hacia arriba
// solo viajan códigos simbólicos y detalles tipados; nunca se parsean
// strings de error.
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Códigos de error del protocolo RPC (contrato fijo, valores numéricos
/// idénticos a los del wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCode {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl RpcCode {
    pub fn status(&self) -> u32 {
        match self {
            RpcCode::Canceled => 1,
            RpcCode::Unknown => 2,
            RpcCode::InvalidArgument => 3,
            RpcCode::DeadlineExceeded => 4,
            RpcCode::NotFound => 5,
            RpcCode::AlreadyExists => 6,
            RpcCode::PermissionDenied => 7,
            RpcCode::ResourceExhausted => 8,
            RpcCode::FailedPrecondition => 9,
            RpcCode::Aborted => 10,
            RpcCode::OutOfRange => 11,
            RpcCode::Unimplemented => 12,
            RpcCode::Internal => 13,
            RpcCode::Unavailable => 14,
            RpcCode::DataLoss => 15,
            RpcCode::Unauthenticated => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RpcCode::Canceled => "canceled",
            RpcCode::Unknown => "unknown",
            RpcCode::InvalidArgument => "invalid_argument",
            RpcCode::DeadlineExceeded => "deadline_exceeded",
            RpcCode::NotFound => "not_found",
            RpcCode::AlreadyExists => "already_exists",
            RpcCode::PermissionDenied => "permission_denied",
            RpcCode::ResourceExhausted => "resource_exhausted",
            RpcCode::FailedPrecondition => "failed_precondition",
            RpcCode::Aborted => "aborted",
            RpcCode::OutOfRange => "out_of_range",
            RpcCode::Unimplemented => "unimplemented",
            RpcCode::Internal => "internal",
            RpcCode::Unavailable => "unavailable",
            RpcCode::DataLoss => "data_loss",
            RpcCode::Unauthenticated => "unauthenticated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "canceled" => RpcCode::Canceled,
            "unknown" => RpcCode::Unknown,
            "invalid_argument" => RpcCode::InvalidArgument,
            "deadline_exceeded" => RpcCode::DeadlineExceeded,
            "not_found" => RpcCode::NotFound,
            "already_exists" => RpcCode::AlreadyExists,
            "permission_denied" => RpcCode::PermissionDenied,
            "resource_exhausted" => RpcCode::ResourceExhausted,
            "failed_precondition" => RpcCode::FailedPrecondition,
            "aborted" => RpcCode::Aborted,
            "out_of_range" => RpcCode::OutOfRange,
            "unimplemented" => RpcCode::Unimplemented,
            "internal" => RpcCode::Internal,
            "unavailable" => RpcCode::Unavailable,
            "data_loss" => RpcCode::DataLoss,
            "unauthenticated" => RpcCode::Unauthenticated,
            _ => return None,
        })
    }

    /// Fallback cuando el cuerpo de error no trae código: mapeo HTTP -> RPC
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => RpcCode::Internal,
            401 => RpcCode::Unauthenticated,
            403 => RpcCode::PermissionDenied,
            404 => RpcCode::Unimplemented,
            408 => RpcCode::DeadlineExceeded,
            429 | 502 | 503 | 504 => RpcCode::Unavailable,
            _ => RpcCode::Unknown,
        }
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Violación de un campo individual (errores de validación de formularios)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    pub field: String,
    pub description: String,
}

/// Detalle estructurado adjunto a un error. El match es por IDENTIDAD del
/// tipo de esquema, nunca por parseo de strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    BadRequest { violations: Vec<FieldViolation> },
    Unknown { type_url: String },
}

pub const BAD_REQUEST_DETAIL_TYPE: &str = "google.rpc.BadRequest";

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: RpcCode,
    pub message: String,
    pub details: Vec<ErrorDetail>,
}

impl RpcError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Fallo a nivel de red/transporte
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == RpcCode::Unauthenticated
    }

    /// Parsea el cuerpo de error del protocolo:
    /// `{"code": "...", "message": "...", "details": [{"type": "...", "debug": {...}}]}`
    pub fn from_response_body(http_status: u16, body: &str) -> Self {
        let parsed: Option<WireError> = serde_json::from_str(body).ok();
        match parsed {
            Some(wire) => {
                let code = wire
                    .code
                    .as_deref()
                    .and_then(RpcCode::from_name)
                    .unwrap_or_else(|| RpcCode::from_http_status(http_status));
                let details = wire.details.into_iter().map(WireDetail::decode).collect();
                Self {
                    code,
                    message: wire.message.unwrap_or_default(),
                    details,
                }
            }
            None => Self::new(
                RpcCode::from_http_status(http_status),
                format!("HTTP {}", http_status),
            ),
        }
    }

    /// Violaciones de validación indexadas por campo (para formularios)
    pub fn violations_by_field(&self) -> HashMap<String, String> {
        let mut by_field = HashMap::new();
        for detail in &self.details {
            if let ErrorDetail::BadRequest { violations } = detail {
                for violation in violations {
                    by_field.insert(violation.field.clone(), violation.description.clone());
                }
            }
        }
        by_field
    }
}

#[derive(Deserialize)]
struct WireError {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    details: Vec<WireDetail>,
}

#[derive(Deserialize)]
struct WireDetail {
    #[serde(rename = "type")]
    type_url: String,
    #[serde(default)]
    debug: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBadRequest {
    #[serde(default)]
    field_violations: Vec<FieldViolation>,
}

impl WireDetail {
    fn decode(self) -> ErrorDetail {
        if self.type_url == BAD_REQUEST_DETAIL_TYPE {
            if let Some(debug) = self.debug {
                if let Ok(bad_request) = serde_json::from_value::<WireBadRequest>(debug) {
                    return ErrorDetail::BadRequest {
                        violations: bad_request.field_violations,
                    };
                }
            }
        }
        ErrorDetail::Unknown {
            type_url: self.type_url,
        }
    }
}
