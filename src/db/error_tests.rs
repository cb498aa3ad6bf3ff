//! Unit tests for database error types

#[cfg(test)]
mod tests {
    use crate::db::error::DbError;
    use std::error::Error;

    #[test]
    fn test_bucket_not_found_error() {
        let error = DbError::BucketNotFound(r#""a" / 0xff"#.to_string());
        assert_eq!(error.to_string(), r#"Bucket not found: "a" / 0xff"#);
    }

    #[test]
    fn test_not_a_bucket_error() {
        let error = DbError::NotABucket(r#""a""#.to_string());
        assert_eq!(error.to_string(), r#"Not a bucket: "a""#);
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_debug() {
        let error = DbError::InvalidInput("test error".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("InvalidInput"));
        assert!(debug.contains("test error"));
    }

    #[test]
    fn test_decode_error_conversion() {
        let decoded: Result<(u32, usize), _> =
            bincode::decode_from_slice(&[], bincode::config::standard());
        let error: DbError = decoded.unwrap_err().into();
        assert!(matches!(error, DbError::DecodeError(_)));
        assert!(error.to_string().starts_with("Error while decoding data"));
    }
}
