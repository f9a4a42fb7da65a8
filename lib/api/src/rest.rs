use actix_web::{web, App, HttpMessage, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use actix_cors::Cors;
use shelfwise_core::{BookId, Error, FieldFilter, FilterCondition};
use shelfwise_storage::CatalogManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::auth::{AuthConfig, AuthError, Claims, JwtMiddleware};

#[derive(Deserialize)]
struct SearchQuery {
    title: Option<String>,
    category: Option<String>,
}

#[derive(Deserialize)]
struct PriceRangeQuery {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Deserialize)]
struct PredictionRequest {
    book_title: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    books: usize,
    category_scheme: String,
    recommender: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommender_error: Option<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        manager: Arc<CatalogManager>,
        auth: Arc<AuthConfig>,
        port: u16,
        request_timeout: Duration,
    ) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .configure(configure(manager.clone(), auth.clone()))
        })
        .client_request_timeout(request_timeout)
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register app data and every route. Shared by the server and the HTTP tests.
pub fn configure(
    manager: Arc<CatalogManager>,
    auth: Arc<AuthConfig>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(manager))
            .app_data(web::Data::from(auth.clone()))
            .route("/", web::get().to(root))
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health))
                    .route("/books", web::get().to(list_books))
                    // fixed paths before /books/{id}
                    .route("/books/search", web::get().to(search_books))
                    .route("/books/top-rated", web::get().to(top_rated_books))
                    .route("/books/price-range", web::get().to(price_range_books))
                    .route("/books/{id}", web::get().to(get_book))
                    .route("/categories", web::get().to(list_categories))
                    .route("/stats/overview", web::get().to(stats_overview))
                    .route("/stats/categories", web::get().to(stats_categories))
                    .route("/ml/features", web::get().to(ml_features))
                    .route("/ml/predictions", web::post().to(ml_predictions))
                    .route("/auth/login", web::post().to(login))
                    .service(
                        web::scope("/auth/protected")
                            .wrap(JwtMiddleware::new(auth))
                            .route("", web::get().to(protected)),
                    ),
            );
    }
}

fn error_body(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

/// Map a core error onto its HTTP status
fn error_response(error: &Error) -> HttpResponse {
    match error {
        Error::BookNotFound(_) => HttpResponse::NotFound().json(error_body(error)),
        Error::CategoryUnreconciled { .. } => {
            HttpResponse::UnprocessableEntity().json(error_body(error))
        }
        Error::IndexUnavailable(_) => HttpResponse::ServiceUnavailable().json(error_body(error)),
        _ => HttpResponse::InternalServerError().json(error_body(error)),
    }
}

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

async fn root() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "shelfwise API is running"
    })))
}

async fn health(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    let ready = manager.is_recommender_ready();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        books: manager.catalog().len(),
        category_scheme: manager.encoder().scheme().to_string(),
        recommender: if ready { "ready" } else { "unavailable" },
        recommender_error: manager.init_error().map(|e| e.to_string()),
    }))
}

async fn list_books(
    manager: web::Data<Arc<CatalogManager>>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    info!("Book listing requested by {}", client_ip(&req));
    Ok(HttpResponse::Ok().json(manager.catalog().titles()))
}

async fn get_book(
    manager: web::Data<Arc<CatalogManager>>,
    path: web::Path<String>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    let raw = path.into_inner();
    let id = BookId::from(raw.as_str());
    info!("Lookup of book id {} by {}", raw, client_ip(&req));

    match manager.catalog().find_by_id(&id) {
        Some(book) => Ok(HttpResponse::Ok().json(book)),
        None => Ok(error_response(&Error::BookNotFound(raw))),
    }
}

async fn search_books(
    manager: web::Data<Arc<CatalogManager>>,
    query: web::Query<SearchQuery>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    let SearchQuery { title, category } = query.into_inner();

    let mut conditions = Vec::new();
    if let Some(title) = &title {
        conditions.push(FilterCondition::TitleEquals(title.clone()));
    }
    if let Some(category) = &category {
        conditions.push(FilterCondition::CategoryEquals(category.clone()));
    }

    if conditions.is_empty() {
        info!("Search without title or category from {}", client_ip(&req));
        return Ok(HttpResponse::BadRequest()
            .json(error_body("A title or category is required to search")));
    }

    info!(
        "Search title={:?} category={:?} by {}",
        title,
        category,
        client_ip(&req)
    );
    let filter = FieldFilter::new(FilterCondition::And(conditions));
    Ok(HttpResponse::Ok().json(manager.catalog().search(&filter)))
}

async fn top_rated_books(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(manager.catalog().top_rated()))
}

async fn price_range_books(
    manager: web::Data<Arc<CatalogManager>>,
    query: web::Query<PriceRangeQuery>,
) -> ActixResult<HttpResponse> {
    let (min, max) = match (query.min, query.max) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Ok(HttpResponse::BadRequest()
                .json(error_body("Both min and max price are required")))
        }
    };

    let books = manager.catalog().price_range(min, max);
    if books.is_empty() {
        return Ok(HttpResponse::NotFound().json(error_body("No books found in this price range")));
    }
    Ok(HttpResponse::Ok().json(books))
}

async fn list_categories(
    manager: web::Data<Arc<CatalogManager>>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    info!("Category listing requested by {}", client_ip(&req));
    Ok(HttpResponse::Ok().json(manager.catalog().categories()))
}

async fn stats_overview(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(manager.catalog().stats()))
}

async fn stats_categories(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(manager.catalog().category_stats()))
}

async fn ml_features(manager: web::Data<Arc<CatalogManager>>) -> ActixResult<HttpResponse> {
    if manager.catalog().is_empty() {
        warn!("Feature dump requested but the catalog is empty");
        return Ok(HttpResponse::NotFound().json(error_body("No books available")));
    }

    let report = manager.features();
    if report.skipped > 0 {
        warn!("{} books skipped in feature dump: unknown category", report.skipped);
    }
    info!("Returning {} features", report.features.len());
    Ok(HttpResponse::Ok().json(report))
}

async fn ml_predictions(
    manager: web::Data<Arc<CatalogManager>>,
    query: web::Query<PredictionRequest>,
    body: Option<web::Json<PredictionRequest>>,
) -> ActixResult<HttpResponse> {
    let title = body
        .and_then(|b| b.into_inner().book_title)
        .or_else(|| query.into_inner().book_title);

    let title = match title {
        Some(title) => title,
        None => return Ok(HttpResponse::BadRequest().json(error_body("book_title is required"))),
    };

    let result = manager
        .recommender()
        .and_then(|service| service.recommend(&title));

    match result {
        Ok(result) => {
            info!(
                "Returning {} recommendations for '{}'",
                result.recommendations.len(),
                result.input_book
            );
            Ok(HttpResponse::Ok().json(result))
        }
        Err(e) => {
            warn!("Recommendation for '{}' failed: {}", title, e);
            Ok(error_response(&e))
        }
    }
}

async fn login(
    auth: web::Data<AuthConfig>,
    body: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    let LoginRequest { username, password } = body.into_inner();

    if let Err(e) = auth.authenticate(&username, &password) {
        warn!("Failed login for '{}'", username);
        return Ok(HttpResponse::Unauthorized().json(error_body(e)));
    }

    match auth.issue_token(&username) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(TokenResponse {
            access_token,
            token_type: "bearer",
        })),
        Err(e) => Ok(HttpResponse::InternalServerError().json(error_body(e))),
    }
}

async fn protected(req: HttpRequest) -> ActixResult<HttpResponse> {
    let subject = req.extensions().get::<Claims>().map(|c| c.sub.clone());
    match subject {
        Some(sub) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": format!("Hello {}, this is a protected route!", sub)
        }))),
        None => Ok(HttpResponse::Unauthorized()
            .json(error_body(AuthError::InvalidToken("no claims on request".to_string())))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::Value;
    use shelfwise_core::{Book, Catalog, Rating};
    use shelfwise_storage::StoreConfig;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Book::new(1u64, "A Light in the Attic", 51.77, Rating::Three, "In stock", "Poetry"),
            Book::new(2u64, "Tipping the Velvet", 53.74, Rating::One, "In stock", "Historical Fiction"),
            Book::new(3u64, "Soumission", 50.10, Rating::One, "In stock", "Fiction"),
            Book::new(4u64, "Sharp Objects", 47.82, Rating::Four, "In stock", "Mystery"),
            Book::new(5u64, "Sapiens", 54.23, Rating::Five, "In stock", "History"),
            Book::new(6u64, "The Requiem Red", 22.65, Rating::One, "In stock", "Young Adult"),
            Book::new(7u64, "The Dirty Little Secrets", 33.34, Rating::Four, "In stock", "Business"),
            Book::new(8u64, "Mystery Two", 20.00, Rating::Four, "In stock", "Mystery"),
            Book::new(9u64, "Cookbook", 30.00, Rating::Four, "In stock", "Food and Drink"),
        ])
    }

    fn manager(catalog: Catalog) -> Arc<CatalogManager> {
        Arc::new(CatalogManager::from_catalog(catalog, &StoreConfig::new("unused.json")))
    }

    fn auth() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new("test-secret", 30, "admin", "admin123").unwrap())
    }

    #[actix_web::test]
    async fn test_browse_routes() {
        let app = test::init_service(App::new().configure(configure(manager(catalog()), auth()))).await;

        let req = test::TestRequest::get().uri("/api/v1/books").to_request();
        let titles: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(titles.len(), 9);
        assert_eq!(titles[0], "A Light in the Attic");

        let req = test::TestRequest::get().uri("/api/v1/books/4").to_request();
        let book: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(book["title"], "Sharp Objects");
        assert_eq!(book["rating"], "Four");

        let req = test::TestRequest::get().uri("/api/v1/books/999").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/api/v1/books/top-rated").to_request();
        let books: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(books.len(), 5);

        let req = test::TestRequest::get().uri("/api/v1/categories").to_request();
        let categories: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(categories.len(), 9);
        assert_eq!(categories[3], "Mystery");
    }

    #[actix_web::test]
    async fn test_search_and_price_range() {
        let app = test::init_service(App::new().configure(configure(manager(catalog()), auth()))).await;

        let req = test::TestRequest::get().uri("/api/v1/books/search?category=Mystery").to_request();
        let books: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(books.len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/v1/books/search?title=Sharp%20Objects&category=Poetry")
            .to_request();
        let books: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(books.is_empty());

        let req = test::TestRequest::get().uri("/api/v1/books/search").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::get().uri("/api/v1/books/price-range?min=20&max=30").to_request();
        let books: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(books.len(), 3);

        let req = test::TestRequest::get().uri("/api/v1/books/price-range?min=20").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::get().uri("/api/v1/books/price-range?min=900&max=1000").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_stats() {
        let app = test::init_service(App::new().configure(configure(manager(catalog()), auth()))).await;

        let req = test::TestRequest::get().uri("/api/v1/stats/overview").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["total_books"], 9);

        let req = test::TestRequest::get().uri("/api/v1/stats/categories").to_request();
        let stats: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let mystery = stats.iter().find(|s| s["category"] == "Mystery").unwrap();
        assert_eq!(mystery["count"], 2);
        assert_eq!(mystery["average_price"], 33.91);
    }

    #[actix_web::test]
    async fn test_predictions() {
        let app = test::init_service(App::new().configure(configure(manager(catalog()), auth()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/ml/predictions")
            .set_json(serde_json::json!({ "book_title": "sharp objects" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let result: Value = test::read_body_json(resp).await;
        assert_eq!(result["input_book"], "Sharp Objects");
        let recs = result["recommendations"].as_array().unwrap();
        assert!(recs.len() <= 5);
        assert!(recs.iter().all(|r| r["title"] != "Sharp Objects"));

        let req = test::TestRequest::post()
            .uri("/api/v1/ml/predictions?book_title=Sharp%20Objects")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post()
            .uri("/api/v1/ml/predictions?book_title=Unknown%20Book")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post().uri("/api/v1/ml/predictions").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_unreconciled_category_is_422() {
        let mut books = catalog().books().to_vec();
        books.push(Book::new(10u64, "Odd One", 10.0, Rating::Three, "In stock", "Cryptozoology"));
        let app = test::init_service(App::new().configure(configure(manager(Catalog::new(books)), auth()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/ml/predictions?book_title=Odd%20One")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 422);

        let req = test::TestRequest::get().uri("/api/v1/ml/features").to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["skipped"], 1);
        assert_eq!(report["features"].as_array().unwrap().len(), 9);
    }

    #[actix_web::test]
    async fn test_degraded_mode() {
        let small = Catalog::new(catalog().books()[..3].to_vec());
        let app = test::init_service(App::new().configure(configure(manager(small), auth()))).await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let health: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["recommender"], "unavailable");
        assert_eq!(health["books"], 3);

        let req = test::TestRequest::post()
            .uri("/api/v1/ml/predictions?book_title=Soumission")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 503);

        let req = test::TestRequest::get().uri("/api/v1/books").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_login_and_protected() {
        let app = test::init_service(App::new().configure(configure(manager(catalog()), auth()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(serde_json::json!({ "username": "admin", "password": "wrong" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(serde_json::json!({ "username": "admin", "password": "admin123" }))
            .to_request();
        let token: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(token["token_type"], "bearer");
        let access_token = token["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri("/api/v1/auth/protected").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/v1/auth/protected")
            .insert_header(("Authorization", format!("Bearer {}", access_token)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Hello admin, this is a protected route!");
    }
}
