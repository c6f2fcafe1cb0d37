//! Define our own macro to simplify the code
//!

/// Call the HTTP client with the proper arguments
///
/// - unauth call to fetch token by submitting credentials as a form
///
#[macro_export]
macro_rules! http_post_form {
    ($self:ident, $url:expr, $form:expr) => {
        $self
            .client
            .clone()
            .post($url)
            .header("user-agent", &$self.user_agent)
            .form($form)
            .send()
    };
}

/// Call the HTTP client with the proper arguments
///
/// - auth call with query parameters, token passed along
///
#[macro_export]
macro_rules! http_get_auth {
    ($self:ident, $url:expr, $token:ident, $query:expr) => {
        $self
            .client
            .clone()
            .get($url)
            .header("user-agent", &$self.user_agent)
            .query($query)
            .query(&[("token", $token)])
            .send()
    };
    ($self:ident, $url:expr, $token:ident) => {
        $self
            .client
            .clone()
            .get($url)
            .header("user-agent", &$self.user_agent)
            .query(&[("token", $token)])
            .send()
    };
}

/// Call the HTTP client with the proper arguments
///
/// - auth call submitting a form, token is one of the fields
///
#[macro_export]
macro_rules! http_post_form_auth {
    ($self:ident, $url:expr, $token:ident, $form:expr) => {{
        let mut form: Vec<(&str, &str)> = $form.to_vec();
        form.push(("token", $token));
        $self
            .client
            .clone()
            .post($url)
            .header("user-agent", &$self.user_agent)
            .form(&form)
            .send()
    }};
}
