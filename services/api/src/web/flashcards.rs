//! services/api/src/web/flashcards.rs
//!
//! Handlers for flashcard sets, cards, the due-card review queue, grading,
//! finished-session recording and LLM card generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::domain::{Flashcard, GeneratedCard};
use study_buddy_core::ports::NewCard;
use study_buddy_core::review::{self, ReviewGrade};
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct NewCardRequest {
    pub question: String,
    pub answer: String,
    pub image_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSetRequest {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<NewCardRequest>,
}

#[derive(Serialize, ToSchema)]
pub struct SetResponse {
    pub id: Uuid,
    pub name: String,
    pub card_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct CardResponse {
    pub id: Uuid,
    pub set_id: Uuid,
    pub question: String,
    pub answer: String,
    pub image_url: Option<String>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl From<Flashcard> for CardResponse {
    fn from(c: Flashcard) -> Self {
        Self {
            id: c.id,
            set_id: c.set_id,
            question: c.question,
            answer: c.answer,
            image_url: c.image_url,
            last_reviewed_at: c.last_reviewed_at,
            next_review_at: c.next_review_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct GradeRequest {
    /// "wrong", "good" or "easy".
    #[schema(value_type = String)]
    pub grade: ReviewGrade,
}

#[derive(Serialize, ToSchema)]
pub struct GradeResponse {
    pub card_id: Uuid,
    pub next_review_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct FinishSessionRequest {
    pub correct: i32,
    pub incorrect: i32,
}

#[derive(Serialize, ToSchema)]
pub struct FinishSessionResponse {
    pub session_id: Uuid,
    pub correct: i32,
    pub incorrect: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateCardsRequest {
    pub topic: String,
    pub language: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GeneratedCardResponse {
    pub question: String,
    pub answer: String,
}

impl From<GeneratedCard> for GeneratedCardResponse {
    fn from(c: GeneratedCard) -> Self {
        Self {
            question: c.question,
            answer: c.answer,
        }
    }
}

fn to_new_cards(cards: Vec<NewCardRequest>) -> Vec<NewCard> {
    cards
        .into_iter()
        .map(|c| NewCard {
            question: c.question,
            answer: c.answer,
            image_url: c.image_url,
        })
        .collect()
}

//=========================================================================================
// Set Handlers
//=========================================================================================

/// GET /flashcards/sets - List the user's sets with card counts
#[utoipa::path(
    get,
    path = "/flashcards/sets",
    responses(
        (status = 200, description = "Sets with card counts", body = [SetResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_sets_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sets = state
        .db
        .list_sets_with_counts(user_id)
        .await
        .map_err(port_error)?;
    let response: Vec<SetResponse> = sets
        .into_iter()
        .map(|(set, card_count)| SetResponse {
            id: set.id,
            name: set.name,
            card_count,
            created_at: set.created_at,
        })
        .collect();
    Ok(Json(response))
}

/// POST /flashcards/sets - Create a set together with its initial cards
#[utoipa::path(
    post,
    path = "/flashcards/sets",
    request_body = CreateSetRequest,
    responses(
        (status = 201, description = "Set created", body = SetResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateSetRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Set name is required".to_string()));
    }
    for card in &req.cards {
        if card.question.trim().is_empty() || card.answer.trim().is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                "Every card needs a question and an answer".to_string(),
            ));
        }
    }

    let card_count = req.cards.len() as i64;
    let cards = to_new_cards(req.cards);
    let set = state
        .db
        .create_set_with_cards(user_id, req.name.trim(), &cards)
        .await
        .map_err(port_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SetResponse {
            id: set.id,
            name: set.name,
            card_count,
            created_at: set.created_at,
        }),
    ))
}

/// DELETE /flashcards/sets/{set_id} - Delete a set and all of its cards
#[utoipa::path(
    delete,
    path = "/flashcards/sets/{set_id}",
    params(("set_id" = Uuid, Path, description = "Set id")),
    responses(
        (status = 204, description = "Set deleted"),
        (status = 404, description = "Set not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_set_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(set_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_set(user_id, set_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Card Handlers
//=========================================================================================

/// GET /flashcards/sets/{set_id}/cards - All cards in a set
#[utoipa::path(
    get,
    path = "/flashcards/sets/{set_id}/cards",
    params(("set_id" = Uuid, Path, description = "Set id")),
    responses(
        (status = 200, description = "Cards in the set", body = [CardResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_cards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(set_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cards = state
        .db
        .list_cards_for_set(user_id, set_id)
        .await
        .map_err(port_error)?;
    let response: Vec<CardResponse> = cards.into_iter().map(CardResponse::from).collect();
    Ok(Json(response))
}

/// GET /flashcards/sets/{set_id}/queue - Cards currently due for review
///
/// Never-scheduled cards come first; an empty list means nothing is due.
#[utoipa::path(
    get,
    path = "/flashcards/sets/{set_id}/queue",
    params(("set_id" = Uuid, Path, description = "Set id")),
    responses(
        (status = 200, description = "Due cards, oldest first", body = [CardResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn due_queue_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(set_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cards = state
        .db
        .list_cards_for_set(user_id, set_id)
        .await
        .map_err(port_error)?;
    let queue = review::build_queue(cards, Utc::now());
    let response: Vec<CardResponse> = queue.into_iter().map(CardResponse::from).collect();
    Ok(Json(response))
}

/// POST /flashcards/sets/{set_id}/cards - Add a card to a set
#[utoipa::path(
    post,
    path = "/flashcards/sets/{set_id}/cards",
    request_body = NewCardRequest,
    params(("set_id" = Uuid, Path, description = "Set id")),
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(set_id): Path<Uuid>,
    Json(req): Json<NewCardRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.question.trim().is_empty() || req.answer.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Question and answer are required".to_string(),
        ));
    }
    let card = NewCard {
        question: req.question,
        answer: req.answer,
        image_url: req.image_url,
    };
    let created = state
        .db
        .create_card(user_id, set_id, &card)
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(CardResponse::from(created))))
}

/// DELETE /flashcards/cards/{card_id} - Delete a single card
#[utoipa::path(
    delete,
    path = "/flashcards/cards/{card_id}",
    params(("card_id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "Card not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(card_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_card(user_id, card_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Review Handlers
//=========================================================================================

/// POST /flashcards/cards/{card_id}/grade - Grade a card during review
///
/// Reschedules the card from the grading instant: wrong = 10 minutes,
/// good = 1 day, easy = 4 days.
#[utoipa::path(
    post,
    path = "/flashcards/cards/{card_id}/grade",
    request_body = GradeRequest,
    params(("card_id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 200, description = "Card rescheduled", body = GradeResponse),
        (status = 404, description = "Card not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn grade_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(card_id): Path<Uuid>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Ownership check before the write.
    let card = state
        .db
        .get_card(user_id, card_id)
        .await
        .map_err(port_error)?;

    let now = Utc::now();
    let next = review::next_review_at(req.grade, now);
    state
        .db
        .update_card_review(user_id, card.id, now, next)
        .await
        .map_err(port_error)?;

    Ok(Json(GradeResponse {
        card_id: card.id,
        next_review_at: next,
    }))
}

/// POST /flashcards/sets/{set_id}/sessions - Record a finished review session
#[utoipa::path(
    post,
    path = "/flashcards/sets/{set_id}/sessions",
    request_body = FinishSessionRequest,
    params(("set_id" = Uuid, Path, description = "Set id")),
    responses(
        (status = 201, description = "Session recorded", body = FinishSessionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn finish_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(set_id): Path<Uuid>,
    Json(req): Json<FinishSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.correct < 0 || req.incorrect < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Counts must be non-negative".to_string(),
        ));
    }

    let session = state
        .db
        .create_study_session(user_id, set_id, req.correct, req.incorrect)
        .await
        .map_err(port_error)?;

    // Statistics rollup is best-effort; the recorded session is the
    // source of truth.
    let today = Utc::now().date_naive();
    if let Err(e) = state
        .db
        .add_reviewed_flashcards(user_id, today, req.correct + req.incorrect)
        .await
    {
        warn!("Failed to update review statistics: {:?}", e);
    }

    Ok((
        StatusCode::CREATED,
        Json(FinishSessionResponse {
            session_id: session.id,
            correct: session.correct,
            incorrect: session.incorrect,
        }),
    ))
}

//=========================================================================================
// Generation Handler
//=========================================================================================

/// POST /flashcards/generate - Generate card drafts for a topic with the LLM
///
/// Nothing is persisted; the client reviews the drafts and saves them as a
/// set explicitly.
#[utoipa::path(
    post,
    path = "/flashcards/generate",
    request_body = GenerateCardsRequest,
    responses(
        (status = 200, description = "Generated card drafts", body = [GeneratedCardResponse]),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "The model returned unusable output"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn generate_cards_handler(
    State(state): State<Arc<AppState>>,
    Extension(_user_id): Extension<Uuid>,
    Json(req): Json<GenerateCardsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.topic.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Topic is required".to_string()));
    }
    let language = req.language.unwrap_or_else(|| "English".to_string());

    let cards = state
        .card_adapter
        .generate_cards(req.topic.trim(), &language)
        .await
        .map_err(|e| {
            error!("Card generation failed: {:?}", e);
            port_error(e)
        })?;

    let response: Vec<GeneratedCardResponse> = cards
        .into_iter()
        .map(GeneratedCardResponse::from)
        .collect();
    Ok(Json(response))
}
