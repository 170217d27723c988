use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{CustomerChartsOutputType, ReportDetailType, SearchInputType},
};

/***************** Query models *********************/

/**
 * Query parameters of the searchable pages.
 */
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /**
     * Text entered in the search box.
     */
    pub search: Option<String>,
}

impl From<&SearchQuery> for SearchInputType {
    fn from(query: &SearchQuery) -> Self {
        SearchInputType::new(query.search.clone())
    }
}

/**
 * Query parameters of the customers page.
 */
#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    /**
     * Text entered in the search box.
     */
    pub search: Option<String>,
    /**
     * Email of the customer selected in the table.
     */
    pub selected: Option<String>,
}

impl From<&CustomersQuery> for SearchInputType {
    fn from(query: &CustomersQuery) -> Self {
        SearchInputType::new(query.search.clone())
    }
}

/**
 * Query parameters of the reports page.
 */
#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    /**
     * Selected tab.
     */
    pub tab: Option<String>,
}

/***************** Chart models *********************/

/**
 * Series for the customer charts.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerChartsResponse {
    top_spenders: Vec<TopSpenderElement>,
    monthly_tickets: Vec<MonthlyTicketsElement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSpenderElement {
    name: String,
    amount_paid: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTicketsElement {
    /**
     * Month formatted as `YYYY-MM`.
     */
    month: String,
    tickets: i64,
}

impl From<CustomerChartsOutputType> for CustomerChartsResponse {
    fn from(output: CustomerChartsOutputType) -> Self {
        CustomerChartsResponse {
            top_spenders: output.top_spenders.into_iter().map(|spender| TopSpenderElement { name: spender.name, amount_paid: spender.amount_paid }).collect(),
            monthly_tickets: output.monthly_tickets.into_iter().map(|month| MonthlyTicketsElement { month: month.label(), tickets: month.tickets }).collect(),
        }
    }
}

/**
 * Yearly report series. Every vector has one entry per year, in year order.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    years: Vec<i32>,
    annual_revenues: Vec<Option<Decimal>>,
    new_members: Vec<Option<i64>>,
    annual_expenses: Vec<Option<Decimal>>,
}

impl From<Vec<ReportDetailType>> for ReportsResponse {
    fn from(reports: Vec<ReportDetailType>) -> Self {
        ReportsResponse {
            years: reports.iter().map(|report| report.year).collect(),
            annual_revenues: reports.iter().map(|report| report.annual_revenue).collect(),
            new_members: reports.iter().map(|report| report.new_members).collect(),
            annual_expenses: reports.iter().map(|report| report.annual_expenses).collect(),
        }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }

    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Export => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::DatabaseError => 1003,
        ErrorType::Validation => 1004,
        ErrorType::NotFound => 1005,
        ErrorType::Export => 1006,
    }
}
