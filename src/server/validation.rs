use crate::server::response::ApiError;

const MAX_EMAIL_LEN: usize = 254;
const MAX_STORE_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request(format!(
            "Email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    if email.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Email cannot contain whitespace"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::bad_request("Email must contain an @ sign"));
    };
    if local.is_empty() || domain.is_empty() {
        return Err(ApiError::bad_request("Email is malformed"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_store_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Store name cannot be empty"));
    }
    if name.len() > MAX_STORE_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Store name cannot exceed {MAX_STORE_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_store_url(url: &str) -> Result<(), ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("Store URL cannot be empty"));
    }
    if url.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Store URL cannot contain whitespace"));
    }
    Ok(())
}
