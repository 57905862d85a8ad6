use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sheet_optimizer::{
    CutPiece, OptimizationError, OptimizationResult, OptimizeOptions, SheetSize, optimize,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    sheets: Vec<SheetRequest>,
    pieces: Vec<PieceRequest>,
    #[serde(default)]
    options: OptimizeOptions,
}

/// Wire form of a sheet. Dimensions are signed so a negative value is reported
/// against the sheet instead of failing the whole body.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SheetRequest {
    width: i64,
    height: i64,
    #[serde(default)]
    material: String,
    #[serde(default)]
    thickness: f64,
    #[serde(default)]
    price_per_sheet: f64,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PieceRequest {
    id: String,
    width: i64,
    height: i64,
    quantity: i64,
    #[serde(default = "default_true")]
    can_rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Zero passes through so the library reports it with its own wording.
fn to_u32(value: i64, field: &str) -> Result<u32, String> {
    if value < 0 {
        return Err(format!("{field} must be positive, got {value}"));
    }
    u32::try_from(value).map_err(|_| format!("{field} is too large, got {value}"))
}

impl SheetRequest {
    fn into_sheet(self, index: usize) -> Result<SheetSize, OptimizationError> {
        let invalid = |reason: String| OptimizationError::invalid_sheet(index, reason);
        Ok(SheetSize {
            width: to_u32(self.width, "width").map_err(invalid)?,
            height: to_u32(self.height, "height").map_err(invalid)?,
            material: self.material,
            thickness: self.thickness,
            price_per_sheet: self.price_per_sheet,
        })
    }
}

impl PieceRequest {
    fn into_piece(self) -> Result<CutPiece, OptimizationError> {
        let invalid = |reason: String| OptimizationError::invalid_piece(&self.id, reason);
        let width = to_u32(self.width, "width").map_err(invalid)?;
        let height = to_u32(self.height, "height").map_err(invalid)?;
        let quantity = to_u32(self.quantity, "quantity").map_err(invalid)?;
        Ok(CutPiece {
            id: self.id,
            width,
            height,
            quantity,
            can_rotate: self.can_rotate,
            label: self.label,
        })
    }
}

impl OptimizeRequest {
    fn into_parts(
        self,
    ) -> Result<(Vec<SheetSize>, Vec<CutPiece>, OptimizeOptions), OptimizationError> {
        let sheets = self
            .sheets
            .into_iter()
            .enumerate()
            .map(|(index, s)| s.into_sheet(index))
            .collect::<Result<Vec<_>, _>>()?;
        let pieces = self
            .pieces
            .into_iter()
            .map(PieceRequest::into_piece)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((sheets, pieces, self.options))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    piece_ids: Option<Vec<String>>,
}

enum ApiError {
    /// Body was not JSON or did not match the request shape.
    Malformed(JsonRejection),
    Optimize(OptimizationError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Optimize(OptimizationError::UnplaceablePiece { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Malformed(rejection) => ErrorBody {
                error: rejection.body_text(),
                kind: "invalid_request",
                piece_ids: None,
            },
            Self::Optimize(e) => ErrorBody {
                error: e.to_string(),
                kind: e.kind(),
                piece_ids: e.piece_ids().map(<[String]>::to_vec),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

async fn optimize_handler(
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizationResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("malformed request: {}", rejection.body_text());
        ApiError::Malformed(rejection)
    })?;
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let result = req
        .into_parts()
        .and_then(|(sheets, pieces, options)| optimize(&sheets, &pieces, &options))
        .map_err(|e| {
            tracing::warn!(kind = e.kind(), "optimize rejected: {e}");
            ApiError::Optimize(e)
        })?;
    Ok(Json(result))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

struct ServerConfig {
    port: String,
    log_file: String,
    sentry_dsn: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").unwrap_or_else(|_| "3001".to_string()),
            log_file: std::env::var("LOG_FILE").unwrap_or_else(|_| "development.log".to_string()),
            sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty()),
        }
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();

    let _sentry = sentry::init(sentry::ClientOptions {
        dsn: config.sentry_dsn.as_deref().and_then(|dsn| dsn.parse().ok()),
        release: sentry::release_name!(),
        ..Default::default()
    });

    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", config.log_file, e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: cannot bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app()).await {
        tracing::error!("server stopped: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn post_optimize(body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/optimize")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn request(sheet: Value, piece: Value) -> String {
        json!({ "sheets": [sheet], "pieces": [piece] }).to_string()
    }

    #[test]
    fn test_request_defaults_options() {
        let req: OptimizeRequest = serde_json::from_str(
            r#"{
                "sheets": [{"width": 2000, "height": 1000, "pricePerSheet": 40}],
                "pieces": [{"id": "A", "width": 600, "height": 400, "quantity": 1, "canRotate": false}]
            }"#,
        )
        .unwrap();
        assert_eq!(req.options, OptimizeOptions::default());
        let (sheets, pieces, _) = req.into_parts().unwrap();
        assert_eq!(sheets[0], SheetSize::new(2000, 1000).with_price(40.0));
        assert_eq!(pieces[0], CutPiece::new("A", 600, 400, 1).fixed());
    }

    #[test]
    fn test_wire_values_out_of_range_name_the_offender() {
        let piece = PieceRequest {
            id: "big".into(),
            width: 10,
            height: i64::from(u32::MAX) + 1,
            quantity: 1,
            can_rotate: true,
            label: None,
        };
        let err = piece.into_piece().unwrap_err();
        assert!(matches!(
            &err,
            OptimizationError::InvalidPiece { id, reason }
                if id == "big" && reason.starts_with("height is too large")
        ));

        let sheet = SheetRequest {
            width: 100,
            height: -1,
            material: String::new(),
            thickness: 0.0,
            price_per_sheet: 0.0,
        };
        assert!(matches!(
            sheet.into_sheet(2).unwrap_err(),
            OptimizationError::InvalidSheet { index: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_up() {
        let request = Request::builder().uri("/up").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optimize_returns_layout() {
        let (status, body) = post_optimize(request(
            json!({"width": 2000, "height": 1000, "pricePerSheet": 40}),
            json!({"id": "A", "width": 600, "height": 400, "quantity": 2}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalSheets"], 1);
        assert_eq!(body["totalCost"], 40.0);
        assert_eq!(body["sheets"][0]["placedPieces"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_negative_width_is_an_invalid_piece() {
        let (status, body) = post_optimize(request(
            json!({"width": 2000, "height": 1000}),
            json!({"id": "A", "width": -600, "height": 400, "quantity": 1}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_piece");
        assert!(body["error"].as_str().unwrap().contains("'A'"));
        assert!(body.get("pieceIds").is_none());
    }

    #[tokio::test]
    async fn test_negative_sheet_height_is_an_invalid_sheet() {
        let (status, body) = post_optimize(request(
            json!({"width": 2000, "height": -1000}),
            json!({"id": "A", "width": 600, "height": 400, "quantity": 1}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_sheet");
    }

    #[tokio::test]
    async fn test_zero_quantity_is_an_invalid_piece() {
        let (status, body) = post_optimize(request(
            json!({"width": 2000, "height": 1000}),
            json!({"id": "none", "width": 600, "height": 400, "quantity": 0}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_piece");
        assert!(body["error"].as_str().unwrap().contains("quantity must be positive"));
    }

    #[tokio::test]
    async fn test_huge_quantity_is_rejected_up_front() {
        let (status, body) = post_optimize(request(
            json!({"width": 2000, "height": 1000}),
            json!({"id": "A", "width": 10, "height": 10, "quantity": u32::MAX}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_piece");
    }

    #[tokio::test]
    async fn test_unplaceable_piece_is_422() {
        let (status, body) = post_optimize(request(
            json!({"width": 500, "height": 500}),
            json!({"id": "X", "width": 600, "height": 600, "quantity": 1}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "unplaceable_piece");
        assert_eq!(body["pieceIds"], json!(["X"]));
    }

    #[tokio::test]
    async fn test_malformed_body_keeps_error_shape() {
        let (status, body) = post_optimize("{\"sheets\": [").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_request");
        assert!(!body["error"].as_str().unwrap().is_empty());

        let (status, body) = post_optimize(r#"{"sheets": [], "pieces": [{"id": "A"}]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_request");
    }
}
