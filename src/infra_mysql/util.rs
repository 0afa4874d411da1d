use crate::domain_model::ConflictField;
use sqlx::mysql::MySqlDatabaseError;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// ER_DUP_ENTRY names the violated index, e.g.
/// `Duplicate entry 'a@b.c' for key 'user_account.uq_user_account_email'`.
pub fn conflict_field(message: &str) -> ConflictField {
    let key = message.rsplit("for key").next().unwrap_or(message);
    if key.contains("email") {
        ConflictField::Email
    } else {
        ConflictField::Username
    }
}
