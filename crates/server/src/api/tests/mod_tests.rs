use super::*;
use crate::session::SessionDelivery;
use axum::http::{header, HeaderValue};
use shared::domain::{Category, Price};

const TEST_COST: u32 = 4;

fn session_config() -> SessionConfig {
    SessionConfig {
        secret: "test-secret".into(),
        ttl_seconds: 3600,
        delivery: SessionDelivery::Cookie,
        secure_cookies: false,
    }
}

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext {
        storage: Some(storage),
        session: session_config(),
        password_hash_cost: TEST_COST,
    }
}

async fn setup_with_admin() -> ApiContext {
    let ctx = setup().await;
    setup_admin(
        &ctx,
        &SetupRequest {
            email: "admin@spoa.com".into(),
            password: "s3nha".into(),
            name: "Admin".into(),
        },
    )
    .await
    .expect("setup admin");
    ctx
}

fn draft(name: &str, cents: i64, category: &str) -> ProductDraft {
    ProductDraft {
        name: name.into(),
        description: "desc".into(),
        price: Price::from_cents(cents),
        category: Category::new(category),
        image: String::new(),
        photos: vec!["/a.jpg".into(), "/b.jpg".into()],
        details: vec!["128GB".into()],
        stock: 3,
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_wrong_password() {
    let ctx = setup_with_admin().await;

    let err = login(&ctx, &login_request("ghost@spoa.com", "s3nha"))
        .await
        .expect_err("unknown email");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = login(&ctx, &login_request("admin@spoa.com", "wrong"))
        .await
        .expect_err("wrong password");
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let (admin, token) = login(&ctx, &login_request(" admin@spoa.com ", "s3nha"))
        .await
        .expect("login");
    assert_eq!(admin.name, "Admin");
    let claims = verify_token(&ctx.session, &token).expect("claims");
    assert_eq!(claims.email, "admin@spoa.com");
}

#[tokio::test]
async fn setup_only_creates_the_first_admin() {
    let ctx = setup_with_admin().await;
    let err = setup_admin(
        &ctx,
        &SetupRequest {
            email: "second@spoa.com".into(),
            password: "x".into(),
            name: "Second".into(),
        },
    )
    .await
    .expect_err("second admin");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(status_for(err.code), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn setup_rejects_blank_credentials() {
    let ctx = setup().await;
    let err = setup_admin(
        &ctx,
        &SetupRequest {
            email: "not-an-email".into(),
            password: "x".into(),
            name: "A".into(),
        },
    )
    .await
    .expect_err("bad email");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn unconfigured_store_reports_unavailable() {
    let ctx = ApiContext {
        storage: None,
        session: session_config(),
        password_hash_cost: TEST_COST,
    };
    let err = login(&ctx, &login_request("admin@spoa.com", "x"))
        .await
        .expect_err("no store");
    assert_eq!(err.code, ErrorCode::Unavailable);
    assert_eq!(status_for(err.code), StatusCode::SERVICE_UNAVAILABLE);

    let err = list_products(&ctx, &ProductQuery::default())
        .await
        .expect_err("no store");
    assert_eq!(err.code, ErrorCode::Unavailable);
}

#[tokio::test]
async fn authorize_requires_a_valid_token() {
    let ctx = setup_with_admin().await;
    let mut headers = HeaderMap::new();
    let err = authorize(&ctx, &headers).expect_err("missing");
    assert_eq!(err.message, "Token não fornecido");

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
    let err = authorize(&ctx, &headers).expect_err("garbage");
    assert_eq!(err.message, "Token inválido");

    let (_, token) = login(&ctx, &login_request("admin@spoa.com", "s3nha"))
        .await
        .expect("login");
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
    );
    let claims = authorize(&ctx, &headers).expect("authorized");
    assert!(claims.sub.starts_with("admin:"));
}

#[tokio::test]
async fn create_fills_cover_image_from_first_photo() {
    let ctx = setup().await;
    let product = create_product(&ctx, draft("  iPhone 15  ", 499_990, "novos"))
        .await
        .expect("create");
    assert_eq!(product.name, "iPhone 15");
    assert_eq!(product.image, "/a.jpg");
    assert_eq!(product.photos.len(), 2);
}

#[tokio::test]
async fn create_rejects_invalid_drafts() {
    let ctx = setup().await;

    let err = create_product(&ctx, draft("   ", 100, "novos"))
        .await
        .expect_err("blank name");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_product(&ctx, draft("Case", -1, "acessorios"))
        .await
        .expect_err("negative price");
    assert_eq!(err.code, ErrorCode::Validation);

    let mut no_stock = draft("Case", 100, "acessorios");
    no_stock.stock = -2;
    let err = create_product(&ctx, no_stock)
        .await
        .expect_err("negative stock");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_product(&ctx, draft("Case", 100, " "))
        .await
        .expect_err("blank category");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn update_merges_patch_over_stored_product() {
    let ctx = setup().await;
    let created = create_product(&ctx, draft("Galaxy S23", 350_000, "usados"))
        .await
        .expect("create");

    let patch = ProductPatch {
        price: Some(Price::from_cents(320_000)),
        stock: Some(0),
        ..ProductPatch::default()
    };
    let updated = update_product(&ctx, created.id, patch)
        .await
        .expect("update");
    assert_eq!(updated.name, "Galaxy S23");
    assert_eq!(updated.price, Price::from_cents(320_000));
    assert_eq!(updated.stock, 0);
    assert_eq!(updated.details, vec!["128GB".to_string()]);
}

#[tokio::test]
async fn update_and_delete_report_missing_products() {
    let ctx = setup().await;
    let err = update_product(&ctx, ProductId(404), ProductPatch::default())
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = delete_product(&ctx, ProductId(404))
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = get_product(&ctx, ProductId(404))
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn list_applies_category_and_search() {
    let ctx = setup().await;
    create_product(&ctx, draft("iPhone 15", 499_990, "novos"))
        .await
        .expect("create");
    create_product(&ctx, draft("iPhone 12", 199_990, "usados"))
        .await
        .expect("create");
    create_product(&ctx, draft("Capinha iPhone", 4_990, "acessorios"))
        .await
        .expect("create");

    let all = list_products(
        &ctx,
        &ProductQuery {
            category: Some("todos".into()),
            search: None,
        },
    )
    .await
    .expect("list");
    assert_eq!(all.len(), 3);

    let used = list_products(
        &ctx,
        &ProductQuery {
            category: Some("usados".into()),
            search: Some("iphone".into()),
        },
    )
    .await
    .expect("list");
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].name, "iPhone 12");
}

#[tokio::test]
async fn dashboard_summarizes_catalog_and_orders() {
    let ctx = setup().await;
    create_product(&ctx, draft("A", 1_000, "novos"))
        .await
        .expect("create");
    create_product(&ctx, draft("B", 2_500, "usados"))
        .await
        .expect("create");
    let storage = ctx.storage().expect("storage");
    for i in 0..6 {
        storage
            .insert_order(&format!("cliente {i}"), Price::from_cents(100), "pending")
            .await
            .expect("order");
    }

    let summary = dashboard(&ctx).await.expect("dashboard");
    assert_eq!(summary.total_products, 2);
    assert_eq!(summary.total_value, Price::from_cents(3_500));
    assert_eq!(summary.total_orders, 6);
    assert_eq!(summary.recent_orders.len(), RECENT_ORDERS_LIMIT as usize);
    assert_eq!(summary.recent_orders[0].customer_name, "cliente 5");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_setups_create_a_single_admin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("setup.db").display());
    let storage = Storage::new(&url).await.expect("db");
    let ctx = ApiContext {
        storage: Some(storage.clone()),
        session: session_config(),
        password_hash_cost: TEST_COST,
    };
    let first = SetupRequest {
        email: "a@spoa.com".into(),
        password: "a".into(),
        name: "A".into(),
    };
    let second = SetupRequest {
        email: "b@spoa.com".into(),
        password: "b".into(),
        name: "B".into(),
    };

    let (a, b) = tokio::join!(setup_admin(&ctx, &first), setup_admin(&ctx, &second));
    assert_eq!(
        [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "exactly one setup should win"
    );
    let loser = a.err().or(b.err()).expect("one setup refused");
    assert_eq!(loser.code, ErrorCode::Conflict);
    assert_eq!(storage.count_admin_users().await.expect("count"), 1);
}

#[tokio::test]
async fn first_admin_insert_is_refused_once_table_has_a_row() {
    let ctx = setup_with_admin().await;
    let storage = ctx.storage().expect("storage");
    let second = storage
        .create_first_admin_user("late@spoa.com", "Late", "hash")
        .await
        .expect("insert");
    assert_eq!(second, None);
    assert_eq!(storage.count_admin_users().await.expect("count"), 1);
}

#[tokio::test]
async fn prices_above_the_ceiling_are_rejected_and_dashboard_stays_up() {
    let ctx = setup().await;
    let err = create_product(&ctx, draft("Ouro", i64::MAX, "novos"))
        .await
        .expect_err("absurd price");
    assert_eq!(err.code, ErrorCode::Validation);

    let created = create_product(&ctx, draft("Topo", Price::MAX_CENTS, "novos"))
        .await
        .expect("ceiling price");
    let err = update_product(
        &ctx,
        created.id,
        ProductPatch {
            price: Some(Price::from_cents(Price::MAX_CENTS + 1)),
            ..ProductPatch::default()
        },
    )
    .await
    .expect_err("over ceiling");
    assert_eq!(err.code, ErrorCode::Validation);

    create_product(&ctx, draft("Topo 2", Price::MAX_CENTS, "novos"))
        .await
        .expect("ceiling price");
    let summary = dashboard(&ctx).await.expect("dashboard");
    assert_eq!(summary.total_value, Price::from_cents(2 * Price::MAX_CENTS));
}

#[tokio::test]
async fn valid_bearer_wins_over_stale_cookie() {
    let ctx = setup_with_admin().await;
    let (_, token) = login(&ctx, &login_request("admin@spoa.com", "s3nha"))
        .await
        .expect("login");

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("admin_token=expired"));
    let err = authorize(&ctx, &headers).expect_err("stale cookie alone");
    assert_eq!(err.message, "Token inválido");

    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
    );
    let claims = authorize(&ctx, &headers).expect("bearer accepted");
    assert_eq!(claims.email, "admin@spoa.com");
}
