//! Minimal HTML shells for the admin area. The real screens talk to the JSON
//! API; these exist so the guard has something to protect and redirect to.

use axum::{extract::Path, response::Html};

fn shell(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"pt-BR\"><head><meta charset=\"utf-8\"><title>{title} | SPOA Admin</title></head>\
         <body><main><h1>{title}</h1>{body}</main></body></html>"
    ))
}

const LOGIN_SCRIPT: &str = "<script>\
document.getElementById('login').addEventListener('submit', async (event) => {\
  event.preventDefault();\
  const form = new FormData(event.target);\
  const response = await fetch('/api/login', {\
    method: 'POST',\
    credentials: 'same-origin',\
    headers: { 'content-type': 'application/json' },\
    body: JSON.stringify({ email: form.get('email'), password: form.get('password') }),\
  });\
  if (response.ok) { window.location.href = '/admin/dashboard'; }\
});\
</script>";

/// `/api/login` only takes JSON, so the form is submitted by script.
pub async fn login_page() -> Html<String> {
    shell(
        "Login",
        &format!(
            "<form id=\"login\" method=\"post\" action=\"javascript:void(0)\">\
             <input name=\"email\" type=\"email\" placeholder=\"E-mail\">\
             <input name=\"password\" type=\"password\" placeholder=\"Senha\">\
             <button type=\"submit\">Entrar</button></form>{LOGIN_SCRIPT}"
        ),
    )
}

pub async fn dashboard_page() -> Html<String> {
    shell("Dashboard", "<p data-source=\"/api/admin/dashboard\"></p>")
}

pub async fn products_page() -> Html<String> {
    shell(
        "Produtos",
        "<p data-source=\"/api/products\"></p><a href=\"/admin/products/new\">Novo produto</a>",
    )
}

pub async fn new_product_page() -> Html<String> {
    shell("Novo produto", "<p data-target=\"/api/products\"></p>")
}

pub async fn edit_product_page(Path(product_id): Path<i64>) -> Html<String> {
    shell(
        "Editar produto",
        &format!("<p data-source=\"/api/products/{product_id}\"></p>"),
    )
}
