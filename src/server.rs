use crate::config::Config;
use crate::lookup::{self, Outcome};
use crate::types::Fields;
use bytes::Buf;
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::sync::Arc;
use warp::filters::multipart::FormData;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const MAX_FORM_BYTES: u64 = 64 * 1024;

#[derive(Debug)]
struct InvalidForm;

impl warp::reject::Reject for InvalidForm {}

pub async fn run(config: Config) -> Result<(), warp::Error> {
    let config = Arc::new(config);
    let (addr, server) =
        warp::serve(routes(config.clone())).try_bind_ephemeral(config.listen_addr)?;
    info!(
        "Listening on {}, plates from {} ({})",
        addr,
        config.database_path.display(),
        config.table
    );
    if config.debug_echo {
        warn!("DEBUG_ECHO is on; submitted fields are echoed back on missing plate numbers");
    }
    server.await;
    Ok(())
}

pub fn routes(config: Arc<Config>) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::post()
        .and(warp::path!("license_plate_check"))
        .and(form_fields())
        .and(warp::any().map(move || config.clone()))
        .and_then(handle_lookup)
}

/// Accepts the same bodies an HTML form can submit: multipart or urlencoded.
fn form_fields() -> impl Filter<Extract = (Fields,), Error = Rejection> + Clone {
    let multipart = warp::filters::multipart::form()
        .max_length(MAX_FORM_BYTES)
        .and_then(multipart_fields);
    let urlencoded =
        warp::body::content_length_limit(MAX_FORM_BYTES).and(warp::body::form::<Fields>());
    multipart.or(urlencoded).unify()
}

async fn multipart_fields(form: FormData) -> Result<Fields, Rejection> {
    read_multipart(form).await.map_err(|e| {
        warn!("Error reading multipart form: {:?}", e);
        warp::reject::custom(InvalidForm)
    })
}

async fn read_multipart(mut form: FormData) -> Result<Fields, warp::Error> {
    let mut fields = Fields::new();
    while let Some(part) = form.next().await {
        let part = part?;
        debug!("Got part {}", part.name());
        // Uploaded files are not form fields.
        if part.filename().is_some() {
            warn!("Ignoring file part {}", part.name());
            continue;
        }
        let name = part.name().to_string();
        let mut data: Vec<u8> = vec![];
        let mut stream = part.stream();
        while let Some(buf) = stream.next().await {
            data.extend_from_slice(buf?.bytes());
        }
        match String::from_utf8(data) {
            Ok(value) => fields.push((name, value)),
            Err(_) => warn!("Ignoring non UTF-8 part {}", name),
        }
    }
    Ok(fields)
}

async fn handle_lookup(fields: Fields, config: Arc<Config>) -> Result<Response, Rejection> {
    let outcome =
        tokio::task::spawn_blocking(move || lookup::check_plate(&config, &fields)).await;
    let response = match outcome {
        Ok(Outcome::Matched(body)) => warp::reply::json(&body).into_response(),
        Ok(Outcome::NoPlateNumber(body)) => {
            warp::reply::with_status(warp::reply::json(&body), StatusCode::BAD_REQUEST)
                .into_response()
        }
        Ok(Outcome::Unavailable(body)) => {
            warp::reply::with_status(warp::reply::json(&body), StatusCode::SERVICE_UNAVAILABLE)
                .into_response()
        }
        Ok(Outcome::Failed(e)) => {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!("Lookup task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };
    Ok(response)
}
