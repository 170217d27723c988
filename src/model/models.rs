use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * One database row as an ordered mapping from field name to value.
 */
pub type RowMap = Map<String, Value>;

/**
 * Longest search term accepted from the search boxes.
 */
pub const MAX_SEARCH_LENGTH: usize = 100;

/***************** Entity models *********************/

/**
 * A row of the `movies` table.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetailType {
    pub title: String,
    pub ratings: Option<Decimal>,
    pub description: Option<String>,
    pub link_to_pictures: Option<String>,
}

/**
 * A row of the `scheduling` table.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingDetailType {
    pub movie_title: String,
    pub showtimes: Option<String>,
    /**
     * Running time in minutes.
     */
    pub duration: Option<i32>,
    pub capacity: Option<i32>,
    pub link_to_pictures: Option<String>,
}

/**
 * A row of the `producers` table.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerDetailType {
    pub name: String,
    pub address: Option<String>,
    pub contact_information: Option<String>,
    pub current_balance: Option<Decimal>,
}

/**
 * A row of the `customers` table. Each row is one ticket purchase.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetailType {
    pub name: String,
    pub address: Option<String>,
    pub telephone_number: Option<String>,
    pub email: Option<String>,
    /**
     * Title of the movie the tickets were bought for.
     */
    pub ticket_purchase: Option<String>,
    pub ticket_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub unit_price: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub tickets_purchased: Option<i32>,
}

/**
 * A row of the `reports` table. One row per year.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetailType {
    pub year: i32,
    pub annual_revenue: Option<Decimal>,
    pub new_members: Option<i64>,
    pub annual_expenses: Option<Decimal>,
}

/**
 * Decodes a row mapping into a typed record.
 *
 * # Arguments
 * `row`: The row mapping returned by the data access layer.
 * `entity`: Entity name used in the error message.
 *
 * # Returns
 * The decoded record or a `DatabaseError` if the row does not have the expected shape.
 */
fn decode_row<T: DeserializeOwned>(row: RowMap, entity: &str) -> Result<T, ApplicationError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| {
        tracing::error!("Database error: failed to decode {entity} row: {err}");
        ApplicationError::new(ErrorType::DatabaseError, format!("Database error: failed to decode {entity} row: {err}"))
    })
}

impl TryFrom<RowMap> for MovieDetailType {
    type Error = ApplicationError;

    fn try_from(row: RowMap) -> Result<Self, Self::Error> {
        decode_row(row, "movie")
    }
}

impl TryFrom<RowMap> for SchedulingDetailType {
    type Error = ApplicationError;

    fn try_from(row: RowMap) -> Result<Self, Self::Error> {
        decode_row(row, "scheduling")
    }
}

impl TryFrom<RowMap> for ProducerDetailType {
    type Error = ApplicationError;

    fn try_from(row: RowMap) -> Result<Self, Self::Error> {
        decode_row(row, "producer")
    }
}

impl TryFrom<RowMap> for CustomerDetailType {
    type Error = ApplicationError;

    fn try_from(row: RowMap) -> Result<Self, Self::Error> {
        decode_row(row, "customer")
    }
}

impl TryFrom<RowMap> for ReportDetailType {
    type Error = ApplicationError;

    fn try_from(row: RowMap) -> Result<Self, Self::Error> {
        decode_row(row, "report")
    }
}

/***************** Input models *********************/

/**
 * Free-text search value entered in one of the search boxes.
 */
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchInputType {
    pub term: Option<String>,
}

impl SearchInputType {
    pub fn new(term: Option<String>) -> Self {
        SearchInputType { term }
    }

    /**
     * Normalizes and validates the search term.
     *
     * Surrounding whitespace is removed and a blank term counts as no search.
     *
     * # Returns
     * The normalized input or a `Validation` error if the term is too long.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        let term = self.term.map(|term| term.trim().to_string()).filter(|term| !term.is_empty());
        if term.as_ref().is_some_and(|term| term.chars().count() > MAX_SEARCH_LENGTH) {
            return Err(ApplicationError::new(ErrorType::Validation, format!("Search term can be at most {MAX_SEARCH_LENGTH} characters")));
        }
        Ok(SearchInputType { term })
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }
}

/***************** Output models *********************/

/**
 * Content of the movies page.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum MoviesViewOutputType {
    /**
     * No search term; the full schedule is shown.
     */
    Schedule(Vec<SchedulingDetailType>),
    /**
     * Movies whose title matched the search term.
     */
    Search(Vec<MovieDetailType>),
}

/**
 * Total amount paid by one customer.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TopSpenderType {
    pub name: String,
    pub amount_paid: Decimal,
}

/**
 * Tickets purchased during one calendar month.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTicketsType {
    pub year: i32,
    pub month: u32,
    pub tickets: i64,
}

impl MonthlyTicketsType {
    /**
     * Chart label for the month, e.g. `2024-03`.
     */
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/**
 * Derived series shown in the customer charts.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerChartsOutputType {
    pub top_spenders: Vec<TopSpenderType>,
    pub monthly_tickets: Vec<MonthlyTicketsType>,
}

/**
 * Tickets sold for one of the top rated movies.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct MovieTicketSalesType {
    pub title: String,
    pub tickets_sold: i64,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;
    use crate::model::apperror::captured_logs::CapturedLogs;

    fn to_row(value: Value) -> RowMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_decode_movie_row() {
        let row = to_row(json!({"title": "The Matrix", "ratings": 8.7, "description": "Neo", "link_to_pictures": "/posters/matrix.jpg"}));
        let movie = MovieDetailType::try_from(row).unwrap();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.ratings, Some(Decimal::from_str("8.7").unwrap()));
        assert_eq!(movie.link_to_pictures.as_deref(), Some("/posters/matrix.jpg"));
    }

    #[test]
    fn test_decode_customer_row_with_nulls() {
        let row = to_row(json!({
            "name": "Ann", "address": null, "telephone_number": null, "email": "ann@example.com",
            "ticket_purchase": "The Matrix", "ticket_number": "T-1", "date": "2024-03-15",
            "unit_price": 12.5, "amount_paid": 25, "tickets_purchased": 2
        }));
        let customer = CustomerDetailType::try_from(row).unwrap();
        assert_eq!(customer.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(customer.amount_paid, Some(Decimal::from(25)));
        assert_eq!(customer.tickets_purchased, Some(2));
        assert!(customer.address.is_none());
    }

    #[test]
    fn test_decode_customer_row_keeps_numeric_scale() {
        let row: RowMap = serde_json::from_str(
            r#"{"name" : "Ann Lee", "address" : "12 Main St", "telephone_number" : null, "email" : "ann@example.com", "ticket_purchase" : "The Matrix", "ticket_number" : "T-1", "date" : "2024-03-15", "unit_price" : 12.50, "amount_paid" : 25.00, "tickets_purchased" : 2}"#,
        )
        .unwrap();
        let customer = CustomerDetailType::try_from(row).unwrap();
        assert_eq!(customer.unit_price.unwrap().to_string(), "12.50");
        assert_eq!(customer.amount_paid.unwrap().to_string(), "25.00");
        assert_eq!(customer.tickets_purchased, Some(2));
    }

    #[test]
    fn test_decode_report_row_keeps_numeric_scale() {
        let row: RowMap = serde_json::from_str(r#"{"year" : 2023, "annual_revenue" : 150000.00, "new_members" : 120, "annual_expenses" : 98000.50}"#).unwrap();
        let report = ReportDetailType::try_from(row).unwrap();
        assert_eq!(report.annual_revenue.unwrap().to_string(), "150000.00");
        assert_eq!(report.annual_expenses.unwrap().to_string(), "98000.50");
        assert_eq!(report.new_members, Some(120));
    }

    #[test]
    fn test_decode_report_row_wrong_shape() {
        let (logs, _guard) = CapturedLogs::install();
        let row = to_row(json!({"year": "last year"}));
        let err = ReportDetailType::try_from(row).unwrap_err();
        assert_eq!(err.error_type, ErrorType::DatabaseError);
        assert!(err.message.starts_with("Database error"));
        assert!(logs.contents().contains("Database error: failed to decode report row"));
    }

    #[test]
    fn test_search_input_blank_is_none() {
        assert_eq!(SearchInputType::new(Some("   ".to_string())).validate().unwrap().term(), None);
        assert_eq!(SearchInputType::new(None).validate().unwrap().term(), None);
    }

    #[test]
    fn test_search_input_trimmed() {
        let input = SearchInputType::new(Some("  matrix ".to_string())).validate().unwrap();
        assert_eq!(input.term(), Some("matrix"));
    }

    #[test]
    fn test_search_input_too_long() {
        let err = SearchInputType::new(Some("x".repeat(MAX_SEARCH_LENGTH + 1))).validate().unwrap_err();
        assert_eq!(err.error_type, ErrorType::Validation);
    }

    #[test]
    fn test_monthly_label() {
        let monthly = MonthlyTicketsType { year: 2024, month: 3, tickets: 10 };
        assert_eq!(monthly.label(), "2024-03");
    }
}
