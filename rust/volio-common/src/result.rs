pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;

    fn checked_len(data: &[u8], size: usize, count: usize) -> super::Result<usize> {
        let total = size.checked_mul(count);
        verify_arg!(count, total.is_some());
        Ok(total.unwrap_or_default().min(data.len()))
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(checked_len(b"abcd", 2, 2).unwrap(), 4);
        let err = checked_len(b"abcd", usize::MAX, 2).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(err.to_string().contains("total.is_some()"));
    }
}
