use std::fmt::Write;

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{CustomerChartsOutputType, CustomerDetailType, MovieDetailType, MovieTicketSalesType, MoviesViewOutputType, ProducerDetailType, ReportDetailType, SchedulingDetailType},
};

pub const APPLICATION_TITLE: &str = "Sineflix Movie Theater";
pub const NO_MOVIES_MESSAGE: &str = "No movies match your search.";
pub const NO_PRODUCERS_MESSAGE: &str = "No producers match your search.";
pub const NO_CUSTOMERS_MESSAGE: &str = "No customers match your search.";
pub const LOAD_ERROR_MESSAGE: &str = "An error occurred while loading data.";

const STYLESHEET: &str = "body{margin:0;font-family:sans-serif;background:#272b30;color:#f8f9fa}\
header{background:#3a3f44;margin:8px;padding:16px;border-radius:8px;font-size:1.6em;font-weight:bold}\
.container{display:flex}nav{width:16%;margin:8px;border:1px solid #7a8288;border-radius:8px}\
nav a{display:block;padding:24px 16px;color:#f8f9fa;text-decoration:none}nav a.active{background:#3a3f44}\
main{flex:1;margin:8px}h1{text-align:center}.search{display:flex;justify-content:center;padding:10px}\
.search input{width:70%;padding:10px;border-radius:15px;border:1px solid #ccc}\
.search button{padding:10px;margin-left:10px;border-radius:15px;border:1px solid #ccc}\
.card{display:inline-block;vertical-align:top;width:22%;margin:10px;padding:12px;border:1px solid #f8f9fa;border-radius:8px}\
.card img{width:100%;height:auto}table{width:100%;border-collapse:collapse}td,th{padding:6px;border-bottom:1px solid #7a8288;text-align:left}\
.message{text-align:center;padding:20px}.error{color:#ee5f5b}.tabs a{display:inline-block;padding:10px 16px;color:#808080}\
.tabs a.active{color:#f8f9fa;border-bottom:2px solid #f8f9fa}.chart{margin:20px;padding:10px}\
.bar{display:flex;align-items:center;margin:4px 0}.bar span{width:20%}.bar div{background:#1f77b4;height:18px;margin-right:8px}";

/**
 * Pages registered in the dashboard, in sidebar order.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Movies,
    Producers,
    Customers,
    Reports,
    Updates,
}

impl Page {
    pub const ALL: [Page; 6] = [Page::Home, Page::Movies, Page::Producers, Page::Customers, Page::Reports, Page::Updates];

    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Movies => "Movies",
            Page::Producers => "Producers",
            Page::Customers => "Customers",
            Page::Reports => "Reports",
            Page::Updates => "Updates",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Movies => "/movies",
            Page::Producers => "/producers",
            Page::Customers => "/customers",
            Page::Reports => "/reports",
            Page::Updates => "/updates",
        }
    }
}

/**
 * Tabs of the reports page.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportsTab {
    TopMovies,
    TicketSales,
    Statistics,
}

impl ReportsTab {
    pub const ALL: [ReportsTab; 3] = [ReportsTab::TopMovies, ReportsTab::TicketSales, ReportsTab::Statistics];

    /**
     * Tab for a query parameter value. Unknown or missing values select the first tab.
     */
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("ticket-sales") => ReportsTab::TicketSales,
            Some("statistics") => ReportsTab::Statistics,
            _ => ReportsTab::TopMovies,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            ReportsTab::TopMovies => "top-movies",
            ReportsTab::TicketSales => "ticket-sales",
            ReportsTab::Statistics => "statistics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportsTab::TopMovies => "Top Movies",
            ReportsTab::TicketSales => "Ticket Sales Analysis",
            ReportsTab::Statistics => "Statistics & Graphs",
        }
    }
}

/**
 * Escapes text for use in HTML content and attribute values.
 */
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

/**
 * Percent-encodes a query parameter value.
 */
fn encode_param(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

fn optional(text: Option<&str>) -> String {
    escape(text.unwrap_or(""))
}

fn optional_number<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn message(text: &str) -> String {
    format!("<p class=\"message\">{}</p>", escape(text))
}

/**
 * Message shown in a region whose data could not be loaded. The rest of the page still renders.
 */
fn error_region(error: &ApplicationError) -> String {
    match error.error_type {
        ErrorType::Validation => format!("<p class=\"message error\">{}</p>", escape(&error.message)),
        _ => format!("<p class=\"message error\">{LOAD_ERROR_MESSAGE}</p>"),
    }
}

/**
 * Wraps page content in the dashboard layout with the sidebar built from the page registry.
 */
pub fn layout(active: Page, content: &str) -> String {
    let mut sidebar = String::new();
    for page in Page::ALL {
        let class = if page == active { " class=\"active\"" } else { "" };
        let _ = write!(sidebar, "<a href=\"{}\"{class}>{}</a>", page.path(), page.name());
    }
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title><style>{STYLESHEET}</style></head>\
<body><header>{title}</header><div class=\"container\"><nav>{sidebar}</nav><main>{content}</main></div></body></html>",
        title = APPLICATION_TITLE
    )
}

fn search_form(action: &str, placeholder: &str, search: Option<&str>) -> String {
    format!(
        "<form class=\"search\" method=\"get\" action=\"{action}\"><input type=\"text\" name=\"search\" placeholder=\"{placeholder}\" value=\"{}\"><button type=\"submit\">Search</button></form>",
        optional(search)
    )
}

fn bar_chart(title: &str, bars: &[(String, Decimal)]) -> String {
    let maximum = bars.iter().map(|(_, value)| value.to_f64().unwrap_or_default()).fold(0.0_f64, f64::max);
    let mut chart = format!("<div class=\"chart\"><h3>{}</h3>", escape(title));
    if bars.is_empty() {
        chart.push_str(&message("No data available."));
    }
    for (label, value) in bars {
        let width = if maximum > 0.0 { (value.to_f64().unwrap_or_default() / maximum * 70.0).max(0.0) } else { 0.0 };
        let _ = write!(chart, "<div class=\"bar\"><span>{}</span><div style=\"width:{width:.1}%\"></div>{value}</div>", escape(label));
    }
    chart.push_str("</div>");
    chart
}

/***************** Home *********************/

pub fn home_content(now_showing: &Result<Vec<SchedulingDetailType>, ApplicationError>) -> String {
    let mut content = String::from("<h1>Now Showing</h1>");
    match now_showing {
        Ok(screenings) if screenings.is_empty() => content.push_str(&message("Nothing is scheduled.")),
        Ok(screenings) => {
            for screening in screenings {
                let _ = write!(
                    content,
                    "<div class=\"card\"><img src=\"{}\" alt=\"{title}\"><h4>{title}</h4><p>{}</p><a href=\"{}?search={}\">Details</a></div>",
                    optional(screening.link_to_pictures.as_deref()),
                    optional(screening.showtimes.as_deref()),
                    Page::Movies.path(),
                    encode_param(&screening.movie_title),
                    title = escape(&screening.movie_title),
                );
            }
        }
        Err(err) => content.push_str(&error_region(err)),
    }
    content.push_str("<h1>Coming Soon</h1>");
    content.push_str(&message("The movie gallery is being prepared."));
    content
}

/***************** Movies *********************/

pub fn movies_content(search: Option<&str>, results: &str) -> String {
    format!(
        "<h1>Explore Our Movie Listings</h1>{}<div id=\"movie-results\">{results}</div>",
        search_form(Page::Movies.path(), "Search for a movie...", search)
    )
}

/**
 * Movie cards for a search, or the schedule table when no search is active.
 */
pub fn movies_results(view: &Result<MoviesViewOutputType, ApplicationError>) -> String {
    match view {
        Ok(MoviesViewOutputType::Search(movies)) if movies.is_empty() => message(NO_MOVIES_MESSAGE),
        Ok(MoviesViewOutputType::Search(movies)) => movie_cards(movies),
        Ok(MoviesViewOutputType::Schedule(screenings)) => scheduling_table(screenings),
        Err(err) => error_region(err),
    }
}

fn movie_cards(movies: &[MovieDetailType]) -> String {
    let mut cards = String::new();
    for movie in movies {
        let _ = write!(
            cards,
            "<div class=\"card\"><img src=\"{}\" alt=\"{title}\"><h4>{title}</h4><p>Rating: {}</p><p>{}</p></div>",
            optional(movie.link_to_pictures.as_deref()),
            optional_number(movie.ratings),
            optional(movie.description.as_deref()),
            title = escape(&movie.title),
        );
    }
    cards
}

fn scheduling_table(screenings: &[SchedulingDetailType]) -> String {
    if screenings.is_empty() {
        return message("Nothing is scheduled.");
    }
    let mut table = String::from("<table><tr><th></th><th>Movie</th><th>Showtimes</th><th>Duration (min)</th><th>Capacity</th></tr>");
    for screening in screenings {
        let _ = write!(
            table,
            "<tr><td><img src=\"{}\" alt=\"{title}\" height=\"60\"></td><td>{title}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            optional(screening.link_to_pictures.as_deref()),
            optional(screening.showtimes.as_deref()),
            optional_number(screening.duration),
            optional_number(screening.capacity),
            title = escape(&screening.movie_title),
        );
    }
    table.push_str("</table>");
    table
}

/***************** Producers *********************/

pub fn producers_content(search: Option<&str>, results: &str) -> String {
    format!(
        "<h1>Meet Our Movie Producers</h1>{}<div id=\"producer-results\">{results}</div>",
        search_form(Page::Producers.path(), "Search for a producer...", search)
    )
}

/**
 * Producer table. Nothing is rendered before a search term is entered.
 */
pub fn producers_results(producers: &Result<Option<Vec<ProducerDetailType>>, ApplicationError>) -> String {
    match producers {
        Ok(None) => String::new(),
        Ok(Some(producers)) if producers.is_empty() => message(NO_PRODUCERS_MESSAGE),
        Ok(Some(producers)) => {
            let mut table = String::from("<table><tr><th>Name</th><th>Address</th><th>Contact</th><th>Current balance</th></tr>");
            for producer in producers {
                let _ = write!(
                    table,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&producer.name),
                    optional(producer.address.as_deref()),
                    optional(producer.contact_information.as_deref()),
                    optional_number(producer.current_balance),
                );
            }
            table.push_str("</table>");
            table
        }
        Err(err) => error_region(err),
    }
}

/***************** Customers *********************/

pub fn customers_content(search: Option<&str>, results: &str, detail: &str, charts: &str) -> String {
    format!(
        "<h1>Customer Information and Purchase History</h1>{}<p><a href=\"/customers/export.csv\">Download customer table</a></p>\
<div id=\"customer-results\">{results}</div><div id=\"customer-detail\">{detail}</div><div id=\"customer-charts\">{charts}</div>",
        search_form(Page::Customers.path(), "Search by name or email...", search)
    )
}

/**
 * Customer table with a select link per row. Nothing is rendered before a search term is entered.
 */
pub fn customers_results(search: Option<&str>, customers: &Result<Option<Vec<CustomerDetailType>>, ApplicationError>) -> String {
    match customers {
        Ok(None) => String::new(),
        Ok(Some(customers)) if customers.is_empty() => message(NO_CUSTOMERS_MESSAGE),
        Ok(Some(customers)) => {
            let mut table = String::from("<table><tr><th>Name</th><th>Email</th><th>Telephone</th><th>Movie</th><th>Date</th><th>Tickets</th><th>Amount paid</th><th></th></tr>");
            for customer in customers {
                let select = match &customer.email {
                    Some(email) => format!(
                        "<a href=\"{}?search={}&amp;selected={}\">Select</a>",
                        Page::Customers.path(),
                        encode_param(search.unwrap_or("")),
                        encode_param(email)
                    ),
                    None => String::new(),
                };
                let _ = write!(
                    table,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{select}</td></tr>",
                    escape(&customer.name),
                    optional(customer.email.as_deref()),
                    optional(customer.telephone_number.as_deref()),
                    optional(customer.ticket_purchase.as_deref()),
                    optional_number(customer.date),
                    optional_number(customer.tickets_purchased),
                    optional_number(customer.amount_paid),
                );
            }
            table.push_str("</table>");
            table
        }
        Err(err) => error_region(err),
    }
}

/**
 * Detail panel for the selected customer.
 */
pub fn customer_detail(purchases: &Result<Vec<CustomerDetailType>, ApplicationError>) -> String {
    match purchases {
        Ok(purchases) => {
            let Some(first) = purchases.first() else {
                return message("Customer not found.");
            };
            let mut detail = format!(
                "<h3>{}</h3><p>{}</p><p>{} {}</p><table><tr><th>Ticket</th><th>Movie</th><th>Date</th><th>Unit price</th><th>Tickets</th><th>Amount paid</th></tr>",
                escape(&first.name),
                optional(first.address.as_deref()),
                optional(first.telephone_number.as_deref()),
                optional(first.email.as_deref()),
            );
            for purchase in purchases {
                let _ = write!(
                    detail,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    optional(purchase.ticket_number.as_deref()),
                    optional(purchase.ticket_purchase.as_deref()),
                    optional_number(purchase.date),
                    optional_number(purchase.unit_price),
                    optional_number(purchase.tickets_purchased),
                    optional_number(purchase.amount_paid),
                );
            }
            detail.push_str("</table>");
            detail
        }
        Err(err) if err.error_type == ErrorType::NotFound => message("Customer not found."),
        Err(err) => error_region(err),
    }
}

pub fn customer_charts(charts: &Result<CustomerChartsOutputType, ApplicationError>) -> String {
    match charts {
        Ok(charts) => {
            let spenders: Vec<(String, Decimal)> = charts.top_spenders.iter().map(|spender| (spender.name.clone(), spender.amount_paid)).collect();
            let monthly: Vec<(String, Decimal)> = charts.monthly_tickets.iter().map(|month| (month.label(), Decimal::from(month.tickets))).collect();
            format!("{}{}", bar_chart("Top Customers by Amount Paid", &spenders), bar_chart("Tickets Purchased per Month", &monthly))
        }
        Err(err) => error_region(err),
    }
}

/***************** Reports *********************/

pub fn reports_content(active: ReportsTab, tab_content: &str) -> String {
    let mut tabs = String::from("<div class=\"tabs\">");
    for tab in ReportsTab::ALL {
        let class = if tab == active { " class=\"active\"" } else { "" };
        let _ = write!(tabs, "<a href=\"{}?tab={}\"{class}>{}</a>", Page::Reports.path(), tab.param(), escape(tab.label()));
    }
    tabs.push_str("</div>");
    format!("<h1>Reports Overview</h1>{tabs}<div id=\"reports-tabs-content\">{tab_content}</div>")
}

pub fn top_movies_tab(movies: &Result<Vec<MovieDetailType>, ApplicationError>) -> String {
    let body = match movies {
        Ok(movies) if movies.is_empty() => message("No movies available."),
        Ok(movies) => movie_cards(movies),
        Err(err) => error_region(err),
    };
    format!("<h2>Top Movies</h2>{body}")
}

pub fn ticket_sales_tab(sales: &Result<Vec<MovieTicketSalesType>, ApplicationError>) -> String {
    let body = match sales {
        Ok(sales) => {
            let bars: Vec<(String, Decimal)> = sales.iter().map(|sale| (sale.title.clone(), Decimal::from(sale.tickets_sold))).collect();
            bar_chart("Ticket Sales by Movie", &bars)
        }
        Err(err) => error_region(err),
    };
    format!("<h2>Ticket Sales Analysis</h2>{body}")
}

pub fn statistics_tab(reports: &Result<Vec<ReportDetailType>, ApplicationError>) -> String {
    let body = match reports {
        Ok(reports) => {
            let mut table = String::from("<div class=\"chart\"><h3>Annual Expenses vs. Revenues</h3><table><tr><th>Year</th><th>Expenses</th><th>Revenue</th></tr>");
            for report in reports {
                let _ = write!(table, "<tr><td>{}</td><td>{}</td><td>{}</td></tr>", report.year, optional_number(report.annual_expenses), optional_number(report.annual_revenue));
            }
            table.push_str("</table></div>");
            let members: Vec<(String, Decimal)> = reports.iter().map(|report| (report.year.to_string(), Decimal::from(report.new_members.unwrap_or_default()))).collect();
            format!("{table}{}", bar_chart("New Members per Year", &members))
        }
        Err(err) => error_region(err),
    };
    format!("<h2>Statistics, Graphs &amp; Data Analysis</h2>{body}")
}

/***************** Updates *********************/

pub fn updates_content() -> String {
    format!("<h1>User Profile and Settings</h1>{}{}", message("Personal information updates are not available yet."), message("Transaction history is not available yet."))
}

#[cfg(test)]
mod test {
    use super::*;

    fn movie(title: &str) -> MovieDetailType {
        MovieDetailType { title: title.to_string(), ratings: Some(Decimal::new(87, 1)), description: Some("Neo wakes up".to_string()), link_to_pictures: Some("/posters/matrix.jpg".to_string()) }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<script>alert('x') & \"y\"</script>"), "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;");
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(encode_param("ann lee@example.com"), "ann%20lee%40example.com");
    }

    #[test]
    fn test_layout_sidebar_from_registry() {
        let html = layout(Page::Movies, "<p>body</p>");
        for page in Page::ALL {
            assert!(html.contains(&format!("href=\"{}\"", page.path())));
            assert!(html.contains(page.name()));
        }
        assert!(html.contains("<a href=\"/movies\" class=\"active\">Movies</a>"));
        assert!(html.contains(APPLICATION_TITLE));
    }

    #[test]
    fn test_movie_cards() {
        let html = movies_results(&Ok(MoviesViewOutputType::Search(vec![movie("The Matrix")])));
        assert!(html.contains("<img src=\"/posters/matrix.jpg\" alt=\"The Matrix\">"));
        assert!(html.contains("<h4>The Matrix</h4>"));
        assert!(html.contains("Rating: 8.7"));
        assert!(html.contains("Neo wakes up"));
    }

    #[test]
    fn test_no_movies_message() {
        let html = movies_results(&Ok(MoviesViewOutputType::Search(vec![])));
        assert!(html.contains(NO_MOVIES_MESSAGE));
    }

    #[test]
    fn test_movies_schedule_when_no_search() {
        let screening = SchedulingDetailType { movie_title: "Up".to_string(), showtimes: Some("11:00".to_string()), duration: Some(96), capacity: Some(150), link_to_pictures: None };
        let html = movies_results(&Ok(MoviesViewOutputType::Schedule(vec![screening])));
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>Up</td><td>11:00</td><td>96</td><td>150</td>"));
    }

    #[test]
    fn test_error_region() {
        let html = movies_results(&Err(ApplicationError::new(ErrorType::DatabaseError, "Database error: connection refused".to_string())));
        assert!(html.contains(LOAD_ERROR_MESSAGE));
        assert!(!html.contains("connection refused"));
    }

    #[test]
    fn test_producers_hidden_without_search() {
        assert_eq!(producers_results(&Ok(None)), "");
        assert!(producers_results(&Ok(Some(vec![]))).contains(NO_PRODUCERS_MESSAGE));
    }

    #[test]
    fn test_customer_select_link() {
        let customer = CustomerDetailType {
            name: "Ann Lee".to_string(),
            address: None,
            telephone_number: None,
            email: Some("ann@example.com".to_string()),
            ticket_purchase: None,
            ticket_number: None,
            date: None,
            unit_price: None,
            amount_paid: None,
            tickets_purchased: None,
        };
        let html = customers_results(Some("ann"), &Ok(Some(vec![customer])));
        assert!(html.contains("href=\"/customers?search=ann&amp;selected=ann%40example.com\""));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let html = movies_content(Some("\"><script>"), "");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_reports_tab_param() {
        assert_eq!(ReportsTab::from_param(Some("statistics")), ReportsTab::Statistics);
        assert_eq!(ReportsTab::from_param(Some("unknown")), ReportsTab::TopMovies);
        assert_eq!(ReportsTab::from_param(None), ReportsTab::TopMovies);
        let html = reports_content(ReportsTab::TicketSales, "");
        assert!(html.contains("<a href=\"/reports?tab=ticket-sales\" class=\"active\">Ticket Sales Analysis</a>"));
    }

    #[test]
    fn test_statistics_tab() {
        let reports = vec![ReportDetailType { year: 2023, annual_revenue: Some(Decimal::from(1000)), new_members: Some(12), annual_expenses: Some(Decimal::from(700)) }];
        let html = statistics_tab(&Ok(reports));
        assert!(html.contains("<tr><td>2023</td><td>700</td><td>1000</td></tr>"));
        assert!(html.contains("New Members per Year"));
    }

    #[test]
    fn test_bar_chart_empty() {
        assert!(bar_chart("Empty", &[]).contains("No data available."));
    }
}
