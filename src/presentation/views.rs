use askama::Template;

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate<'a> {
    pub action: &'a str,
    pub error: Option<&'a str>,
}
