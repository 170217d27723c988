use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::{
    dao::query::{Column, Filter, OrderDirection, SelectQuery, Table, fetch_rows},
    model::{
        apperror::ApplicationError,
        models::{CustomerDetailType, MovieDetailType, ProducerDetailType, ReportDetailType, RowMap, SchedulingDetailType},
    },
};

/**
 * DAO for the theater tables. Every operation is a read.
 */
pub struct TheaterDao {}

impl TheaterDao {
    /**
     * Creates a new instance of `TheaterDao`.
     */
    pub fn new() -> Self {
        TheaterDao {}
    }

    /**
     * Movies whose title contains the search term, ignoring case.
     *
     * # Arguments
     * `connection`: The database connection.
     * `term`: The search term.
     *
     * # Returns
     * A Result containing the matching movies or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn search_movies(&self, connection: &mut PgConnection, term: &str) -> Result<Vec<MovieDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::movie_search_query(term)).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * The highest rated movies.
     *
     * # Arguments
     * `connection`: The database connection.
     * `count`: Number of movies to return.
     *
     * # Returns
     * A Result containing at most `count` movies, best rated first.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_top_movies(&self, connection: &mut PgConnection, count: u32) -> Result<Vec<MovieDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::top_movies_query(count)).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * The full screening schedule.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_scheduling(&self, connection: &mut PgConnection) -> Result<Vec<SchedulingDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::scheduling_query()).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * Producers whose name contains the search term, ignoring case.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn search_producers(&self, connection: &mut PgConnection, term: &str) -> Result<Vec<ProducerDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::producer_search_query(term)).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * Customers whose name or email contains the search term, ignoring case.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn search_customers(&self, connection: &mut PgConnection, term: &str) -> Result<Vec<CustomerDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::customer_search_query(term)).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * Customer rows with exactly the given email address.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_customers_by_email(&self, connection: &mut PgConnection, email: &str) -> Result<Vec<CustomerDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::customer_by_email_query(email)).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * The whole customer table, oldest purchase first.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_all_customers(&self, connection: &mut PgConnection) -> Result<Vec<CustomerDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::all_customers_query()).instrument(span).await?;
        Self::decode_rows(rows)
    }

    /**
     * The yearly reports in year order.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_reports(&self, connection: &mut PgConnection) -> Result<Vec<ReportDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let rows = fetch_rows(connection, &Self::reports_query()).instrument(span).await?;
        Self::decode_rows(rows)
    }

    fn movie_search_query(term: &str) -> SelectQuery {
        SelectQuery::new(Table::Movies).filter(Filter::contains_ignore_case(Column::Title, term)).order_by(Column::Title, OrderDirection::Ascending)
    }

    fn top_movies_query(count: u32) -> SelectQuery {
        SelectQuery::new(Table::Movies).order_by(Column::Ratings, OrderDirection::Descending).limit(count)
    }

    fn scheduling_query() -> SelectQuery {
        SelectQuery::new(Table::Scheduling).order_by(Column::MovieTitle, OrderDirection::Ascending)
    }

    fn producer_search_query(term: &str) -> SelectQuery {
        SelectQuery::new(Table::Producers).filter(Filter::contains_ignore_case(Column::Name, term)).order_by(Column::Name, OrderDirection::Ascending)
    }

    fn customer_search_query(term: &str) -> SelectQuery {
        SelectQuery::new(Table::Customers)
            .filter(Filter::AnyOf(vec![Filter::contains_ignore_case(Column::Name, term), Filter::contains_ignore_case(Column::Email, term)]))
            .order_by(Column::Name, OrderDirection::Ascending)
    }

    fn customer_by_email_query(email: &str) -> SelectQuery {
        SelectQuery::new(Table::Customers).filter(Filter::equals(Column::Email, email)).order_by(Column::Date, OrderDirection::Ascending)
    }

    fn all_customers_query() -> SelectQuery {
        SelectQuery::new(Table::Customers).order_by(Column::Date, OrderDirection::Ascending)
    }

    fn reports_query() -> SelectQuery {
        SelectQuery::new(Table::Reports)
    }

    /**
     * Converts row mappings into typed records, failing on the first row that does not decode.
     */
    fn decode_rows<T: TryFrom<RowMap, Error = ApplicationError>>(rows: Vec<RowMap>) -> Result<Vec<T>, ApplicationError> {
        rows.into_iter().map(T::try_from).collect()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::model::apperror::ErrorType;

    fn sql(query: &SelectQuery) -> String {
        query.to_query_builder().unwrap().sql().to_string()
    }

    #[test]
    fn test_movie_search_query() {
        let query = TheaterDao::movie_search_query("matrix");
        assert_eq!(query.table, Table::Movies);
        assert_eq!(query.filter, Some(Filter::ContainsIgnoreCase { column: Column::Title, value: "matrix".to_string() }));
        assert!(sql(&query).ends_with("FROM \"movies\" WHERE \"title\" ILIKE $1 ORDER BY \"title\" ASC, \"ratings\" ASC, \"description\" ASC, \"link_to_pictures\" ASC"));
    }

    #[test]
    fn test_top_movies_query() {
        let query = TheaterDao::top_movies_query(4);
        assert_eq!(query.limit, Some(4));
        assert!(sql(&query).ends_with("FROM \"movies\" ORDER BY \"ratings\" DESC, \"title\" ASC, \"description\" ASC, \"link_to_pictures\" ASC LIMIT $1"));
    }

    #[test]
    fn test_scheduling_query() {
        assert!(sql(&TheaterDao::scheduling_query()).ends_with("FROM \"scheduling\" ORDER BY \"movie_title\" ASC, \"showtimes\" ASC, \"duration\" ASC, \"capacity\" ASC, \"link_to_pictures\" ASC"));
    }

    #[test]
    fn test_producer_search_query() {
        assert!(sql(&TheaterDao::producer_search_query("warner")).ends_with("FROM \"producers\" WHERE \"name\" ILIKE $1 ORDER BY \"name\" ASC, \"address\" ASC, \"contact_information\" ASC, \"current_balance\" ASC"));
    }

    #[test]
    fn test_customer_search_query_matches_name_or_email() {
        assert!(sql(&TheaterDao::customer_search_query("ann")).ends_with("FROM \"customers\" WHERE (\"name\" ILIKE $1 OR \"email\" ILIKE $2) ORDER BY \"name\" ASC, \"address\" ASC, \"telephone_number\" ASC, \"email\" ASC, \"ticket_purchase\" ASC, \"ticket_number\" ASC, \"date\" ASC, \"unit_price\" ASC, \"amount_paid\" ASC, \"tickets_purchased\" ASC"));
    }

    #[test]
    fn test_customer_by_email_query() {
        assert!(sql(&TheaterDao::customer_by_email_query("ann@example.com")).ends_with("FROM \"customers\" WHERE \"email\" = $1 ORDER BY \"date\" ASC, \"name\" ASC, \"address\" ASC, \"telephone_number\" ASC, \"email\" ASC, \"ticket_purchase\" ASC, \"ticket_number\" ASC, \"unit_price\" ASC, \"amount_paid\" ASC, \"tickets_purchased\" ASC"));
    }

    #[test]
    fn test_reports_query_orders_by_year() {
        assert!(sql(&TheaterDao::reports_query()).ends_with("FROM \"reports\" ORDER BY \"year\" ASC, \"annual_revenue\" ASC, \"new_members\" ASC, \"annual_expenses\" ASC"));
    }

    #[test]
    fn test_all_customers_query_breaks_date_ties() {
        assert!(sql(&TheaterDao::all_customers_query()).ends_with("FROM \"customers\" ORDER BY \"date\" ASC, \"name\" ASC, \"address\" ASC, \"telephone_number\" ASC, \"email\" ASC, \"ticket_purchase\" ASC, \"ticket_number\" ASC, \"unit_price\" ASC, \"amount_paid\" ASC, \"tickets_purchased\" ASC"));
    }

    #[test]
    fn test_every_query_is_valid() {
        for query in [
            TheaterDao::movie_search_query("a"),
            TheaterDao::top_movies_query(4),
            TheaterDao::scheduling_query(),
            TheaterDao::producer_search_query("a"),
            TheaterDao::customer_search_query("a"),
            TheaterDao::customer_by_email_query("a"),
            TheaterDao::all_customers_query(),
            TheaterDao::reports_query(),
        ] {
            assert!(query.validate().is_ok(), "{query:?}");
        }
    }

    #[test]
    fn test_decode_rows_fails_on_bad_row() {
        let good = json!({"year": 2023, "annual_revenue": 1000, "new_members": 10, "annual_expenses": 500});
        let bad = json!({"year": null});
        let rows: Vec<RowMap> = vec![good, bad].into_iter().filter_map(|value| value.as_object().cloned()).collect();
        let result: Result<Vec<ReportDetailType>, ApplicationError> = TheaterDao::decode_rows(rows);
        assert_eq!(result.unwrap_err().error_type, ErrorType::DatabaseError);
    }
}
