use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Known unique constraints and the entity they protect.
const UNIQUE_CONSTRAINTS: &[(&str, &str, &str)] = &[("users_email_key", "user", "email")];

/// Foreign keys onto `users`, with the conflict reported when a delete is blocked.
const OWNER_FOREIGN_KEYS: &[(&str, &str)] = &[
    ("orders_user_id_fkey", "has orders"),
    ("products_user_id_fkey", "has products"),
];

/// Utility for converting database errors to structured AppError variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    ///
    /// # Returns
    /// An AppError variant appropriate for the type of database error
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.message(), info.constraint_name(), operation)
            }
            DieselError::NotFound => AppError::not_found("resource", "id", "unknown"),
            other => AppError::persistence(operation, other),
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        message: &str,
        constraint_name: Option<&str>,
        operation: &str,
    ) -> AppError {
        match kind {
            DatabaseErrorKind::UniqueViolation => {
                let known = constraint_name.and_then(|name| {
                    UNIQUE_CONSTRAINTS.iter().find(|(c, _, _)| *c == name)
                });
                match known {
                    Some((_, entity, field)) => AppError::Conflict {
                        entity: entity.to_string(),
                        reason: format!("{field} already exists"),
                    },
                    None => AppError::Conflict {
                        entity: constraint_name.unwrap_or("resource").to_string(),
                        reason: "unique constraint violation".to_string(),
                    },
                }
            }
            // Postgres reports a blocked delete as "update or delete on table ..."
            DatabaseErrorKind::ForeignKeyViolation if message.starts_with("update or delete") => {
                let reason = constraint_name
                    .and_then(|name| OWNER_FOREIGN_KEYS.iter().find(|(c, _)| *c == name))
                    .map_or("is still referenced", |&(_, reason)| reason);
                AppError::Conflict {
                    entity: "user".to_string(),
                    reason: reason.to_string(),
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => AppError::invalid_input(
                constraint_name.unwrap_or("reference"),
                "referenced record does not exist",
            ),
            DatabaseErrorKind::CheckViolation => AppError::invalid_input(
                constraint_name.unwrap_or("value"),
                "value violates a constraint",
            ),
            _ => AppError::persistence(
                operation,
                anyhow::Error::msg(format!("Database error: {}", message)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        constraint_name: Option<String>,
    }

    impl diesel::result::DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, message: &str, constraint: Option<&str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                constraint_name: constraint.map(str::to_string),
            }),
        )
    }

    #[test]
    fn test_email_unique_violation_is_user_conflict() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
            Some("users_email_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Conflict { entity, reason } => {
                assert_eq!(entity, "user");
                assert_eq!(reason, "email already exists");
            }
            other => panic!("Expected Conflict, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_unique_violation_still_conflicts() {
        let error = db_error(DatabaseErrorKind::UniqueViolation, "dup", None);
        assert!(matches!(
            DatabaseErrorConverter::convert_diesel_error(error, "insert"),
            AppError::Conflict { .. }
        ));
    }

    #[test]
    fn test_foreign_key_violation_is_invalid_input() {
        let error = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "insert or update on table \"orders\" violates foreign key constraint",
            Some("orders_user_id_fkey"),
        );
        match DatabaseErrorConverter::convert_diesel_error(error, "insert order") {
            AppError::InvalidInput { errors } => assert_eq!(errors[0].field, "orders_user_id_fkey"),
            other => panic!("Expected InvalidInput, got: {:?}", other),
        }
    }

    #[test]
    fn test_blocked_user_delete_is_conflict() {
        let error = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "update or delete on table \"users\" violates foreign key constraint \"orders_user_id_fkey\" on table \"orders\"",
            Some("orders_user_id_fkey"),
        );
        match DatabaseErrorConverter::convert_diesel_error(error, "delete user") {
            AppError::Conflict { entity, reason } => {
                assert_eq!(entity, "user");
                assert_eq!(reason, "has orders");
            }
            other => panic!("Expected Conflict, got: {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_are_persistence() {
        let error = db_error(DatabaseErrorKind::SerializationFailure, "could not serialize", None);
        match DatabaseErrorConverter::convert_diesel_error(error, "update product") {
            AppError::Persistence { operation, .. } => assert_eq!(operation, "update product"),
            other => panic!("Expected Persistence, got: {:?}", other),
        }
        assert!(matches!(
            DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find"),
            AppError::NotFound { .. }
        ));
    }
}
