use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

use crate::config::SessionConfig;

/// Cookie carrying a new session token. `max_age` should be the session TTL.
pub fn session_cookie(cfg: &SessionConfig, token: String, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::build((cfg.cookie_name.clone(), token))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(cfg.same_site)
        .path("/")
        .max_age(max_age)
        .build();
    if let Some(domain) = &cfg.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Cookie that, once handed to `CookieJar::remove`, makes the browser drop
/// the session cookie. Name, path and domain must match the issued one.
pub fn removal_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((cfg.cookie_name.clone(), ""))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(cfg.same_site)
        .path("/")
        .build();
    if let Some(domain) = &cfg.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

pub fn session_token(cfg: &SessionConfig, jar: &CookieJar) -> Option<String> {
    jar.get(&cfg.cookie_name).map(|c| c.value().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum_extra::extract::cookie::SameSite;

    #[test]
    fn session_cookie_carries_the_configured_policy() {
        let cfg = AppConfig::default().session;
        let cookie = session_cookie(&cfg, "tok".into(), Duration::hours(cfg.ttl_hours));
        assert_eq!(cookie.name(), "taskflow.sid");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn domain_is_applied_when_configured() {
        let mut cfg = AppConfig::default().session;
        cfg.domain = Some("example.app".into());
        assert_eq!(session_cookie(&cfg, "t".into(), Duration::hours(1)).domain(), Some("example.app"));
        assert_eq!(removal_cookie(&cfg).domain(), Some("example.app"));
    }

    #[test]
    fn reads_the_token_from_the_jar() {
        let cfg = AppConfig::default().session;
        let jar = CookieJar::new().add(Cookie::new("taskflow.sid", "abc"));
        assert_eq!(session_token(&cfg, &jar).as_deref(), Some("abc"));
        assert_eq!(session_token(&cfg, &CookieJar::new()), None);
    }
}
