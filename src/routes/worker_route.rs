use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::subscriber::ChatDestination,
    services::{dispatch_texts, InFlight, Notifier, SubscriberStore, SweepTrigger},
};

/// Shared secret the scheduler side presents on every worker call.
pub struct WorkerAuth(pub String);

impl WorkerAuth {
    fn allows(&self, presented: &str) -> bool {
        !self.0.is_empty() && self.0 == presented
    }
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(serde_json::json!({
        "detail": "Direct access to this resource is unavailable."
    }))
}

#[derive(Deserialize)]
struct WorkerAuthBody {
    worker_auth: String,
}

#[post("/queue-tasks")]
async fn queue_tasks(
    body: web::Json<WorkerAuthBody>,
    auth: web::Data<WorkerAuth>,
    sweep_trigger: web::Data<SweepTrigger>,
) -> HttpResponse {
    if !auth.allows(&body.worker_auth) {
        return forbidden();
    }

    if let Err(e) = sweep_trigger.sender.send(()) {
        log::error!("Sweep trigger channel got an Error: {:?}", e);
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "message": "Scheduler is not running"
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({ "message": "Tasks queued" }))
}

#[derive(Deserialize)]
struct SendAdsBody {
    worker_auth: String,
    chat_id: i64,
    ads: Vec<String>,
}

#[derive(Serialize)]
struct SendAdsResponse {
    sent: usize,
    failed: usize,
}

#[post("/send-ads")]
async fn send_ads(
    body: web::Json<SendAdsBody>,
    auth: web::Data<WorkerAuth>,
    notifier: web::Data<dyn Notifier>,
) -> HttpResponse {
    if !auth.allows(&body.worker_auth) {
        return forbidden();
    }

    let (sent, failed) =
        dispatch_texts(notifier.get_ref(), ChatDestination(body.chat_id), &body.ads).await;
    log::info!("Ads sent to {}: {} ok, {} failed", body.chat_id, sent, failed);

    HttpResponse::Ok().json(SendAdsResponse { sent, failed })
}

#[post("/subscribers/{id}/reset-seen")]
async fn reset_seen(
    id: web::Path<Uuid>,
    body: web::Json<WorkerAuthBody>,
    auth: web::Data<WorkerAuth>,
    store: web::Data<dyn SubscriberStore>,
    in_flight: web::Data<InFlight>,
) -> HttpResponse {
    if !auth.allows(&body.worker_auth) {
        return forbidden();
    }

    let id = id.into_inner();
    // Held for the whole write so a search cannot start on this record meanwhile.
    let Some(_guard) = in_flight.claim(id) else {
        return HttpResponse::Conflict().json(serde_json::json!({
            "detail": "A search is running for this user, try again later"
        }));
    };

    match store.reset_seen(id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "message": "Previous ads cleared" })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({ "detail": "User not found" })),
        Err(e) => {
            log::error!("Error resetting previous ads for {}: {:?}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
