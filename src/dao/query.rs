use sqlx::{PgConnection, Postgres, QueryBuilder, types::Json};
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::RowMap,
};

/**
 * Tables the dashboard is allowed to read.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Movies,
    Scheduling,
    Producers,
    Customers,
    Reports,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Movies => "movies",
            Table::Scheduling => "scheduling",
            Table::Producers => "producers",
            Table::Customers => "customers",
            Table::Reports => "reports",
        }
    }

    /**
     * Columns of the table in schema order. `Projection::All` expands to this list.
     */
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Table::Movies => &[Column::Title, Column::Ratings, Column::Description, Column::LinkToPictures],
            Table::Scheduling => &[Column::MovieTitle, Column::Showtimes, Column::Duration, Column::Capacity, Column::LinkToPictures],
            Table::Producers => &[Column::Name, Column::Address, Column::ContactInformation, Column::CurrentBalance],
            Table::Customers => &[
                Column::Name,
                Column::Address,
                Column::TelephoneNumber,
                Column::Email,
                Column::TicketPurchase,
                Column::TicketNumber,
                Column::Date,
                Column::UnitPrice,
                Column::AmountPaid,
                Column::TicketsPurchased,
            ],
            Table::Reports => &[Column::Year, Column::AnnualRevenue, Column::NewMembers, Column::AnnualExpenses],
        }
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns().contains(&column)
    }
}

/**
 * Every column name the dashboard is allowed to reference.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    Ratings,
    Description,
    LinkToPictures,
    MovieTitle,
    Showtimes,
    Duration,
    Capacity,
    Name,
    Address,
    ContactInformation,
    CurrentBalance,
    TelephoneNumber,
    Email,
    TicketPurchase,
    TicketNumber,
    Date,
    UnitPrice,
    AmountPaid,
    TicketsPurchased,
    Year,
    AnnualRevenue,
    NewMembers,
    AnnualExpenses,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Ratings => "ratings",
            Column::Description => "description",
            Column::LinkToPictures => "link_to_pictures",
            Column::MovieTitle => "movie_title",
            Column::Showtimes => "showtimes",
            Column::Duration => "duration",
            Column::Capacity => "capacity",
            Column::Name => "name",
            Column::Address => "address",
            Column::ContactInformation => "contact_information",
            Column::CurrentBalance => "current_balance",
            Column::TelephoneNumber => "telephone_number",
            Column::Email => "email",
            Column::TicketPurchase => "ticket_purchase",
            Column::TicketNumber => "ticket_number",
            Column::Date => "date",
            Column::UnitPrice => "unit_price",
            Column::AmountPaid => "amount_paid",
            Column::TicketsPurchased => "tickets_purchased",
            Column::Year => "year",
            Column::AnnualRevenue => "annual_revenue",
            Column::NewMembers => "new_members",
            Column::AnnualExpenses => "annual_expenses",
        }
    }

    /**
     * Whether the column holds text. Text filters only accept text columns.
     */
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Column::Title
                | Column::Description
                | Column::LinkToPictures
                | Column::MovieTitle
                | Column::Showtimes
                | Column::Name
                | Column::Address
                | Column::ContactInformation
                | Column::TelephoneNumber
                | Column::Email
                | Column::TicketPurchase
                | Column::TicketNumber
        )
    }

    fn quoted(&self) -> String {
        format!("\"{}\"", self.as_str())
    }
}

/**
 * Columns returned by a query.
 */
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<Column>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Ascending => "ASC",
            OrderDirection::Descending => "DESC",
        }
    }
}

/**
 * Row predicate. Values are always sent as bind parameters.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /**
     * Case-insensitive substring match on a text column.
     */
    ContainsIgnoreCase { column: Column, value: String },
    /**
     * Exact match on a text column.
     */
    Equals { column: Column, value: String },
    /**
     * Matches when any of the inner filters matches.
     */
    AnyOf(Vec<Filter>),
}

impl Filter {
    pub fn contains_ignore_case(column: Column, value: &str) -> Self {
        Filter::ContainsIgnoreCase { column, value: value.to_string() }
    }

    pub fn equals(column: Column, value: &str) -> Self {
        Filter::Equals { column, value: value.to_string() }
    }

    fn validate(&self, table: Table) -> Result<(), ApplicationError> {
        match self {
            Filter::ContainsIgnoreCase { column, .. } | Filter::Equals { column, .. } => {
                ensure_column(table, *column)?;
                if !column.is_text() {
                    return Err(ApplicationError::new(ErrorType::Validation, format!("Column {} cannot be used in a text filter", column.as_str())));
                }
                Ok(())
            }
            Filter::AnyOf(filters) => {
                if filters.is_empty() {
                    return Err(ApplicationError::new(ErrorType::Validation, "Filter alternatives cannot be empty".to_string()));
                }
                filters.iter().try_for_each(|filter| filter.validate(table))
            }
        }
    }

    fn push_to(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            Filter::ContainsIgnoreCase { column, value } => {
                builder.push(column.quoted()).push(" ILIKE ").push_bind(contains_pattern(value));
            }
            Filter::Equals { column, value } => {
                builder.push(column.quoted()).push(" = ").push_bind(value.clone());
            }
            Filter::AnyOf(filters) => {
                builder.push("(");
                for (index, filter) in filters.iter().enumerate() {
                    if index > 0 {
                        builder.push(" OR ");
                    }
                    filter.push_to(builder);
                }
                builder.push(")");
            }
        }
    }
}

/**
 * A read-only query against one table.
 *
 * Defaults: all columns, no filter, ordered by `year` ascending, no limit.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: Table,
    pub projection: Projection,
    pub filter: Option<Filter>,
    pub order_column: Column,
    pub order_direction: OrderDirection,
    pub limit: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: Table) -> Self {
        SelectQuery { table, projection: Projection::All, filter: None, order_column: Column::Year, order_direction: OrderDirection::Ascending, limit: None }
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.projection = Projection::Columns(columns);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: Column, direction: OrderDirection) -> Self {
        self.order_column = column;
        self.order_direction = direction;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /**
     * Checks every referenced column against the table's allow-list.
     *
     * # Returns
     * `Ok` when the query can be built, otherwise a `Validation` error.
     */
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if let Projection::Columns(columns) = &self.projection {
            if columns.is_empty() {
                return Err(ApplicationError::new(ErrorType::Validation, "Projection cannot be empty".to_string()));
            }
            columns.iter().try_for_each(|column| ensure_column(self.table, *column))?;
        }
        if let Some(filter) = &self.filter {
            filter.validate(self.table)?;
        }
        ensure_column(self.table, self.order_column)?;
        if self.limit == Some(0) {
            return Err(ApplicationError::new(ErrorType::Validation, "Limit must be positive".to_string()));
        }
        Ok(())
    }

    fn projected_columns(&self) -> &[Column] {
        match &self.projection {
            Projection::All => self.table.columns(),
            Projection::Columns(columns) => columns,
        }
    }

    /**
     * Builds the SQL statement. Each row is returned as a single JSON object keyed by column name.
     *
     * The remaining projected columns follow the order column in ascending order, so rows that tie on
     * the order column always come back in the same sequence and a limit always keeps the same rows.
     *
     * # Returns
     * A query builder with all values bound, or a `Validation` error.
     */
    pub fn to_query_builder(&self) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
        self.validate()?;
        let mut builder = QueryBuilder::new("SELECT json_build_object(");
        {
            let mut separated = builder.separated(", ");
            for column in self.projected_columns() {
                separated.push(format!("'{}', {}", column.as_str(), column.quoted()));
            }
        }
        builder.push(") FROM ").push(format!("\"{}\"", self.table.as_str()));
        if let Some(filter) = &self.filter {
            builder.push(" WHERE ");
            filter.push_to(&mut builder);
        }
        builder.push(" ORDER BY ").push(self.order_column.quoted()).push(" ").push(self.order_direction.as_sql());
        for column in self.projected_columns().iter().filter(|column| **column != self.order_column) {
            builder.push(", ").push(column.quoted()).push(" ASC");
        }
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }
        Ok(builder)
    }
}

/**
 * Executes a query and returns every row as a field-name keyed mapping.
 *
 * # Arguments
 * `connection`: Connection checked out from the pool.
 * `query`: The query to run.
 *
 * # Returns
 * The rows in query order. An empty vector means nothing matched, failures are returned as `DatabaseError`.
 */
#[instrument(skip(connection, query), fields(table = query.table.as_str(), rows))]
pub async fn fetch_rows(connection: &mut PgConnection, query: &SelectQuery) -> Result<Vec<RowMap>, ApplicationError> {
    let span = tracing::Span::current();
    let mut builder = query.to_query_builder()?;
    let rows: Vec<(Json<RowMap>,)> = builder.build_query_as::<(Json<RowMap>,)>().fetch_all(connection).instrument(span.clone()).await.map_err(|err| {
        tracing::error!("Database error: {err}");
        ApplicationError::new(ErrorType::DatabaseError, format!("Database error: {err}"))
    })?;
    span.record("rows", rows.len());
    Ok(rows.into_iter().map(|(Json(row),)| row).collect())
}

fn ensure_column(table: Table, column: Column) -> Result<(), ApplicationError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(ApplicationError::new(ErrorType::Validation, format!("Column {} does not exist in table {}", column.as_str(), table.as_str())))
    }
}

/**
 * Wraps a search value in `%` after escaping LIKE metacharacters, so the value matches literally.
 */
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}
