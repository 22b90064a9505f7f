use axum::http::{HeaderMap, StatusCode};
use shared::{
    domain::{AdminUserSummary, CategoryFilter, Product, ProductId},
    error::{ApiError, ErrorCode},
    protocol::{DashboardSummary, LoginRequest, ProductDraft, ProductPatch, ProductQuery, SetupRequest},
};
use storage::{Storage, StoredAdminUser};
use tracing::{error, info, warn};

use crate::session::{mint_token, session_tokens, verify_token, SessionClaims, SessionConfig};

pub const RECENT_ORDERS_LIMIT: u32 = 5;
const MAX_NAME_CHARS: usize = 200;

#[derive(Clone)]
pub struct ApiContext {
    /// `None` when no database was configured.
    pub storage: Option<Storage>,
    pub session: SessionConfig,
    pub password_hash_cost: u32,
}

impl ApiContext {
    pub fn storage(&self) -> Result<&Storage, ApiError> {
        self.storage.as_ref().ok_or_else(|| {
            ApiError::new(
                ErrorCode::Unavailable,
                "Serviço temporariamente indisponível",
            )
        })
    }
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation | ErrorCode::Conflict => StatusCode::BAD_REQUEST,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Verifies credentials and mints a session token.
///
/// Unknown emails are reported as not found and wrong passwords as
/// unauthorized, so the login form can tell the two apart.
pub async fn login(
    ctx: &ApiContext,
    req: &LoginRequest,
) -> Result<(StoredAdminUser, String), ApiError> {
    let storage = ctx.storage()?;
    let email = req.email.trim();
    let admin = storage
        .find_admin_by_email(email)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            info!(%email, "login for unknown admin");
            ApiError::new(ErrorCode::NotFound, "Usuário não encontrado")
        })?;

    if !verify_password(req.password.clone(), admin.password_hash.clone()).await? {
        warn!(%email, "login with wrong password");
        return Err(ApiError::new(ErrorCode::Unauthorized, "Senha incorreta"));
    }

    let token = mint_token(&ctx.session, &admin).map_err(|e| internal(e.into()))?;
    info!(admin_id = admin.id.0, "admin logged in");
    Ok((admin, token))
}

/// Creates the first administrator. Refused once any admin exists.
pub async fn setup_admin(ctx: &ApiContext, req: &SetupRequest) -> Result<AdminUserSummary, ApiError> {
    let storage = ctx.storage()?;
    let email = req.email.trim();
    let name = req.name.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::new(ErrorCode::Validation, "E-mail inválido"));
    }
    if req.password.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "Senha obrigatória"));
    }

    // Skips the hash when setup is already done; the insert below decides.
    if storage.count_admin_users().await.map_err(internal)? > 0 {
        return Err(admin_already_configured());
    }

    let password_hash = hash_password(req.password.clone(), ctx.password_hash_cost).await?;
    let admin_id = storage
        .create_first_admin_user(email, name, &password_hash)
        .await
        .map_err(internal)?
        .ok_or_else(admin_already_configured)?;
    info!(admin_id = admin_id.0, "first admin created");
    Ok(AdminUserSummary {
        email: email.to_string(),
        name: name.to_string(),
    })
}

/// Resolves the session from the cookie or the `Authorization` header. A
/// stale cookie does not shadow a valid header token.
pub fn authorize(ctx: &ApiContext, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    let tokens = session_tokens(headers);
    if tokens.is_empty() {
        return Err(ApiError::new(ErrorCode::Unauthorized, "Token não fornecido"));
    }
    for token in &tokens {
        match verify_token(&ctx.session, token) {
            Ok(claims) => return Ok(claims),
            Err(error) => info!(%error, "rejected session token"),
        }
    }
    Err(ApiError::new(ErrorCode::Unauthorized, "Token inválido"))
}

pub async fn list_products(ctx: &ApiContext, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
    let filter = query
        .category
        .as_deref()
        .map(CategoryFilter::from_label)
        .unwrap_or_default();
    ctx.storage()?
        .list_products(&filter, query.search.as_deref())
        .await
        .map_err(internal)
}

pub async fn get_product(ctx: &ApiContext, product_id: ProductId) -> Result<Product, ApiError> {
    ctx.storage()?
        .load_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(product_not_found)
}

pub async fn create_product(ctx: &ApiContext, draft: ProductDraft) -> Result<Product, ApiError> {
    let draft = validate_draft(draft)?;
    let storage = ctx.storage()?;
    let product_id = storage.create_product(&draft).await.map_err(internal)?;
    info!(product_id = product_id.0, "product created");
    storage
        .load_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(product_not_found)
}

/// Merges `patch` over the stored product; absent fields are kept.
pub async fn update_product(
    ctx: &ApiContext,
    product_id: ProductId,
    patch: ProductPatch,
) -> Result<Product, ApiError> {
    let storage = ctx.storage()?;
    let current = storage
        .load_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(product_not_found)?;

    let mut draft = ProductDraft::from(current);
    patch.apply_to(&mut draft);
    let draft = validate_draft(draft)?;

    if !storage
        .update_product(product_id, &draft)
        .await
        .map_err(internal)?
    {
        return Err(product_not_found());
    }
    info!(product_id = product_id.0, "product updated");
    storage
        .load_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(product_not_found)
}

pub async fn delete_product(ctx: &ApiContext, product_id: ProductId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage()?
        .delete_product(product_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(product_not_found());
    }
    info!(product_id = product_id.0, "product deleted");
    Ok(())
}

pub async fn dashboard(ctx: &ApiContext) -> Result<DashboardSummary, ApiError> {
    let storage = ctx.storage()?;
    Ok(DashboardSummary {
        total_products: storage.count_products().await.map_err(internal)?,
        total_value: storage.total_catalog_value().await.map_err(internal)?,
        total_orders: storage.count_orders().await.map_err(internal)?,
        recent_orders: storage
            .recent_orders(RECENT_ORDERS_LIMIT)
            .await
            .map_err(internal)?,
    })
}

fn validate_draft(mut draft: ProductDraft) -> Result<ProductDraft, ApiError> {
    draft.name = draft.name.trim().to_string();
    draft.category.0 = draft.category.0.trim().to_string();
    if draft.name.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "Nome do produto é obrigatório"));
    }
    if draft.name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::new(ErrorCode::Validation, "Nome do produto é muito longo"));
    }
    if draft.category.0.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "Categoria é obrigatória"));
    }
    if !draft.price.is_valid() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "Preço deve estar entre R$ 0,00 e R$ 100.000.000,00",
        ));
    }
    if draft.stock < 0 {
        return Err(ApiError::new(ErrorCode::Validation, "Estoque não pode ser negativo"));
    }
    draft.photos.retain(|photo| !photo.trim().is_empty());
    if draft.image.trim().is_empty() {
        if let Some(first) = draft.photos.first() {
            draft.image = first.clone();
        }
    }
    Ok(draft)
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))
}

fn admin_already_configured() -> ApiError {
    ApiError::new(
        ErrorCode::Conflict,
        "Já existe um usuário administrador configurado",
    )
}

fn product_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "Produto não encontrado")
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "request failed");
    ApiError::new(ErrorCode::Internal, "Erro no servidor")
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
