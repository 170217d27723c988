use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{self, ContentType},
    web,
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        export::{CUSTOMERS_EXPORT_FILE, customers_to_csv},
        rest::{CustomerChartsResponse, CustomersQuery, ReportsQuery, ReportsResponse, SearchQuery},
        state::AppState,
        views::{self, Page, ReportsTab},
    },
    model::{apperror::ApplicationError, models::SearchInputType},
};

/**
 * Home page with the current screenings.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "home", trace_id = get_trace_id(&http_request)))]
#[get("/")]
pub async fn home(http_request: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let now_showing = app_state.theater_service.get_now_showing().instrument(span).await;
    html(views::layout(Page::Home, &views::home_content(&now_showing)))
}

/**
 * Movies page. Shows the schedule until a search term is entered.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "movies", trace_id = get_trace_id(&http_request)))]
#[get("/movies")]
pub async fn movies_page(http_request: HttpRequest, query: web::Query<SearchQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let results = render_movie_results(&query, &app_state).instrument(span).await;
    html(views::layout(Page::Movies, &views::movies_content(query.search.as_deref(), &results)))
}

/**
 * Movie search results only.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "movieResults", trace_id = get_trace_id(&http_request)))]
#[get("/fragments/movies")]
pub async fn movies_fragment(http_request: HttpRequest, query: web::Query<SearchQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    html(render_movie_results(&query, &app_state).instrument(span).await)
}

/**
 * Producers page.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "producers", trace_id = get_trace_id(&http_request)))]
#[get("/producers")]
pub async fn producers_page(http_request: HttpRequest, query: web::Query<SearchQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let results = render_producer_results(&query, &app_state).instrument(span).await;
    html(views::layout(Page::Producers, &views::producers_content(query.search.as_deref(), &results)))
}

/**
 * Producer search results only.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "producerResults", trace_id = get_trace_id(&http_request)))]
#[get("/fragments/producers")]
pub async fn producers_fragment(http_request: HttpRequest, query: web::Query<SearchQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    html(render_producer_results(&query, &app_state).instrument(span).await)
}

/**
 * Customers page with search results, the selected customer and the charts.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "customers", trace_id = get_trace_id(&http_request)))]
#[get("/customers")]
pub async fn customers_page(http_request: HttpRequest, query: web::Query<CustomersQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let charts = async { views::customer_charts(&app_state.theater_service.get_customer_charts().await) };
    let (results, detail, charts) =
        async { tokio::join!(render_customer_results(&query, &app_state), render_customer_detail(query.selected.as_deref(), &app_state), charts) }.instrument(span).await;
    html(views::layout(Page::Customers, &views::customers_content(query.search.as_deref(), &results, &detail, &charts)))
}

/**
 * Customer search results and the selected customer only.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "customerResults", trace_id = get_trace_id(&http_request)))]
#[get("/fragments/customers")]
pub async fn customers_fragment(http_request: HttpRequest, query: web::Query<CustomersQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let results = render_customer_results(&query, &app_state).instrument(span.clone()).await;
    let detail = render_customer_detail(query.selected.as_deref(), &app_state).instrument(span).await;
    html(format!("{results}{detail}"))
}

/**
 * Customer table as a CSV download.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "exportCustomers", trace_id = get_trace_id(&http_request)))]
#[get("/customers/export.csv")]
pub async fn customers_export(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let customers = app_state.theater_service.get_all_customers().instrument(span).await?;
    let csv = customers_to_csv(&customers)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((header::CONTENT_DISPOSITION, format!("attachment; filename=\"{CUSTOMERS_EXPORT_FILE}\"")))
        .body(csv))
}

/**
 * Customer chart series as JSON.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "customerCharts", trace_id = get_trace_id(&http_request)))]
#[get("/api/customers/charts")]
pub async fn customer_charts(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let charts = app_state.theater_service.get_customer_charts().instrument(span).await?;
    Ok(HttpResponse::Ok().json(CustomerChartsResponse::from(charts)))
}

/**
 * Reports page.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "reports", trace_id = get_trace_id(&http_request)))]
#[get("/reports")]
pub async fn reports_page(http_request: HttpRequest, query: web::Query<ReportsQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let tab = ReportsTab::from_param(query.tab.as_deref());
    let content = render_reports_tab(tab, &app_state).instrument(span).await;
    html(views::layout(Page::Reports, &views::reports_content(tab, &content)))
}

/**
 * Content of one reports tab.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "reportsTab", trace_id = get_trace_id(&http_request)))]
#[get("/fragments/reports")]
pub async fn reports_fragment(http_request: HttpRequest, query: web::Query<ReportsQuery>, app_state: web::Data<AppState>) -> HttpResponse {
    let span = tracing::Span::current();
    let tab = ReportsTab::from_param(query.tab.as_deref());
    html(render_reports_tab(tab, &app_state).instrument(span).await)
}

/**
 * Yearly report series as JSON.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "reportSeries", trace_id = get_trace_id(&http_request)))]
#[get("/api/reports")]
pub async fn report_series(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let reports = app_state.theater_service.get_reports().instrument(span).await?;
    Ok(HttpResponse::Ok().json(ReportsResponse::from(reports)))
}

/**
 * Profile and settings page.
 */
#[get("/updates")]
pub async fn updates_page() -> HttpResponse {
    html(views::layout(Page::Updates, &views::updates_content()))
}

async fn render_movie_results(query: &SearchQuery, app_state: &AppState) -> String {
    let view = match SearchInputType::from(query).validate() {
        Ok(search) => app_state.theater_service.get_movies_view(&search).await,
        Err(err) => Err(err),
    };
    views::movies_results(&view)
}

async fn render_producer_results(query: &SearchQuery, app_state: &AppState) -> String {
    let producers = match SearchInputType::from(query).validate() {
        Ok(search) => app_state.theater_service.get_producers(&search).await,
        Err(err) => Err(err),
    };
    views::producers_results(&producers)
}

async fn render_customer_results(query: &CustomersQuery, app_state: &AppState) -> String {
    let search = SearchInputType::from(query).validate();
    let customers = match &search {
        Ok(search) => app_state.theater_service.get_customers(search).await,
        Err(err) => Err(err.clone()),
    };
    let term = search.as_ref().ok().and_then(SearchInputType::term);
    views::customers_results(term, &customers)
}

async fn render_customer_detail(selected: Option<&str>, app_state: &AppState) -> String {
    match selected.map(str::trim).filter(|email| !email.is_empty()) {
        Some(email) => views::customer_detail(&app_state.theater_service.get_customer(email).await),
        None => String::new(),
    }
}

async fn render_reports_tab(tab: ReportsTab, app_state: &AppState) -> String {
    match tab {
        ReportsTab::TopMovies => views::top_movies_tab(&app_state.theater_service.get_top_movies().await),
        ReportsTab::TicketSales => views::ticket_sales_tab(&app_state.theater_service.get_ticket_sales().await),
        ReportsTab::Statistics => views::statistics_tab(&app_state.theater_service.get_reports().await),
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
