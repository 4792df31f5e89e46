use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use actix_web::guard::GuardContext;
use actix_web::http::header;
use arbiter_core::record::latin1;
use arbiter_core::{BlobMeta, Upload};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::errors::ArbiterHttpErr;
use crate::services::{AppState, APP_TYPE_JSON};

/// Name of the form field carrying the file in a multipart upload.
const FILE_FIELD: &str = "file";

#[derive(Deserialize, Validate)]
struct UploadParams {
    #[validate(length(max = 255))]
    filename: Option<String>,
    /// Reported size; defaults to the file length.
    size: Option<u64>,
}

impl UploadParams {
    /// Validates the parameters against the received file and builds the upload.
    /// A `filename` query parameter wins over the one the file came with.
    fn into_upload(
        self,
        file_name: Option<String>,
        content_type: Option<String>,
        payload: Vec<u8>,
    ) -> Result<Upload, ArbiterHttpErr> {
        let params = UploadParams { filename: self.filename.or(file_name), size: self.size };
        params.validate()?;
        Ok(Upload {
            filename: params.filename.unwrap_or_default(),
            size: params.size.unwrap_or(payload.len() as u64),
            content_type,
            payload,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct UploadResponse {
    metadata: BlobMeta,
}

#[derive(Serialize, Deserialize)]
struct LoadResponse {
    metadata: BlobMeta,
    #[serde(with = "latin1")]
    data: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct SizeResponse {
    total_size: u64,
}

fn is_multipart(ctx: &GuardContext) -> bool {
    ctx.header::<header::ContentType>()
        .map_or(false, |content_type| content_type.0.essence_str() == "multipart/form-data")
}

async fn submit(shared_state: &AppState, new_upload: Upload) -> Result<HttpResponse, ArbiterHttpErr> {
    let metadata = shared_state.node.upload(new_upload).await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(UploadResponse { metadata }))
}

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json("OK")
}

/// Multipart form upload; the blob is the `file` field, which also supplies
/// the filename and content type. Responds as soon as the blob is handed to
/// the pipeline; which nodes keep it is settled afterwards.
#[post("/upload/", guard = "is_multipart")]
async fn upload_form(
    params: web::Query<UploadParams>,
    mut form: Multipart,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ArbiterHttpErr> {
    while let Some(mut field) = form.try_next().await? {
        if field.content_disposition().get_name() != Some(FILE_FIELD) {
            while field.try_next().await?.is_some() {}
            continue;
        }

        let file_name = field.content_disposition().get_filename().map(str::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let mut payload = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if payload.len() + chunk.len() > shared_state.max_upload_bytes {
                return Err(ArbiterHttpErr::TooLarge(shared_state.max_upload_bytes));
            }
            payload.extend_from_slice(&chunk);
        }

        let new_upload = params.into_inner().into_upload(file_name, content_type, payload)?;
        return submit(&shared_state, new_upload).await;
    }
    Err(ArbiterHttpErr::MissingFile)
}

/// Raw upload: the request body is the blob, the `Content-Type` header its
/// content type.
#[post("/upload/")]
async fn upload(
    req: HttpRequest,
    params: web::Query<UploadParams>,
    body: web::Bytes,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ArbiterHttpErr> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let upload = params.into_inner().into_upload(None, content_type, body.to_vec())?;
    submit(&shared_state, upload).await
}

#[get("/file/{id}")]
async fn get_file(
    id: web::Path<String>,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ArbiterHttpErr> {
    let (metadata, data) = shared_state.node.load(&id).await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(LoadResponse { metadata, data }))
}

#[get("/size/")]
async fn get_size(shared_state: web::Data<AppState>) -> Result<HttpResponse, ArbiterHttpErr> {
    let total_size = shared_state.node.total_size().await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(SizeResponse { total_size }))
}
