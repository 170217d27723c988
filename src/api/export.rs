use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::CustomerDetailType,
};

/**
 * File name offered for the customer spreadsheet download.
 */
pub const CUSTOMERS_EXPORT_FILE: &str = "customers.csv";

/**
 * Writes the customer table as CSV with a header row named after the table columns.
 *
 * # Arguments
 * `customers`: Rows to export, in the order they are written.
 *
 * # Returns
 * The CSV document, or an `Export` error if a row cannot be written.
 */
pub fn customers_to_csv(customers: &[CustomerDetailType]) -> Result<Vec<u8>, ApplicationError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for customer in customers {
        writer.serialize(customer).map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to write customer row: {err}")))?;
    }
    writer.into_inner().map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to finish customer export: {err}")))
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::models::RowMap;

    #[test]
    fn test_customers_to_csv() {
        let customer = CustomerDetailType {
            name: "Lee, Ann".to_string(),
            address: Some("12 Main St".to_string()),
            telephone_number: None,
            email: Some("ann@example.com".to_string()),
            ticket_purchase: Some("Up".to_string()),
            ticket_number: Some("T-1".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 1, 12),
            unit_price: Some(Decimal::new(1250, 2)),
            amount_paid: Some(Decimal::new(2500, 2)),
            tickets_purchased: Some(2),
        };
        let csv = String::from_utf8(customers_to_csv(&[customer]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,address,telephone_number,email,ticket_purchase,ticket_number,date,unit_price,amount_paid,tickets_purchased"));
        assert_eq!(lines.next(), Some("\"Lee, Ann\",12 Main St,,ann@example.com,Up,T-1,2024-01-12,12.50,25.00,2"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_customers_to_csv_from_database_row() {
        let row: RowMap = serde_json::from_str(
            r#"{"name" : "Ann Lee", "address" : "12 Main St", "telephone_number" : "555-0101", "email" : "ann@example.com", "ticket_purchase" : "The Matrix", "ticket_number" : "T-1001", "date" : "2024-01-12", "unit_price" : 12.50, "amount_paid" : 25.00, "tickets_purchased" : 2}"#,
        )
        .unwrap();
        let customer = CustomerDetailType::try_from(row).unwrap();
        let csv = String::from_utf8(customers_to_csv(&[customer]).unwrap()).unwrap();
        assert_eq!(csv.lines().nth(1), Some("Ann Lee,12 Main St,555-0101,ann@example.com,The Matrix,T-1001,2024-01-12,12.50,25.00,2"));
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        assert!(customers_to_csv(&[]).unwrap().is_empty());
    }
}
