use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};
use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::models::jwt::{ACCESS_TOKEN_HOURS, REFRESH_TOKEN_DAYS, SessionTokens, TokenPair};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

const API_PATH: &str = "/api";
const SECURE: bool = true; // Set to true for HTTPS
const HTTP_ONLY: bool = true;
const SAME_SITE: SameSite = SameSite::Strict;

pub struct CookieService;

impl CookieService {
    /// Both session cookies, set at login.
    pub fn set_auth_cookies(pair: &TokenPair) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let access_cookie = Self::create_cookie(
            ACCESS_TOKEN_COOKIE,
            &pair.access_token,
            Duration::hours(ACCESS_TOKEN_HOURS),
        );
        let refresh_cookie = Self::create_cookie(
            REFRESH_TOKEN_COOKIE,
            &pair.refresh_token,
            Duration::days(REFRESH_TOKEN_DAYS),
        );

        Self::append(&mut headers, &access_cookie);
        Self::append(&mut headers, &refresh_cookie);
        headers
    }

    /// The renewal side channel: only the access cookie is replaced.
    pub fn refreshed_access_cookie(access_token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = Self::create_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token,
            Duration::hours(ACCESS_TOKEN_HOURS),
        );
        Self::append(&mut headers, &cookie);
        headers
    }

    pub fn clear_auth_cookies() -> HeaderMap {
        let mut headers = HeaderMap::new();
        Self::append(&mut headers, &Self::create_removal_cookie(ACCESS_TOKEN_COOKIE));
        Self::append(&mut headers, &Self::create_removal_cookie(REFRESH_TOKEN_COOKIE));
        headers
    }

    /// Reads the session pair out of the request's Cookie headers.
    pub fn extract_session(headers: &HeaderMap) -> SessionTokens {
        let mut session = SessionTokens::default();

        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for cookie in Cookie::split_parse(raw).flatten() {
                match cookie.name() {
                    ACCESS_TOKEN_COOKIE => session.access_token = Some(cookie.value().to_string()),
                    REFRESH_TOKEN_COOKIE => session.refresh_token = Some(cookie.value().to_string()),
                    _ => {}
                }
            }
        }

        session
    }

    fn append(headers: &mut HeaderMap, cookie: &Cookie<'static>) {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            headers.append(SET_COOKIE, value);
        }
    }

    fn create_cookie(name: &str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .secure(SECURE)
            .http_only(HTTP_ONLY)
            .same_site(SAME_SITE)
            .path(API_PATH)
            .max_age(max_age)
            .build()
    }

    fn create_removal_cookie(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .secure(SECURE)
            .http_only(HTTP_ONLY)
            .same_site(SAME_SITE)
            .path(API_PATH)
            .expires(OffsetDateTime::now_utc() - Duration::days(1))
            .build()
    }
}
