//! Navigation targets and their URL-style paths.

/// A screen the application can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: landing page with the sign-up form
    Home,
    /// `/admin`: protected by the access gate
    Admin,
    /// `/patients/{userId}/register`
    Register { user_id: String },
    /// `/patients/{userId}/new-appointment`
    NewAppointment { user_id: String },
    /// `/patients/{userId}/new-appointment/success?appointmentId={id}`
    AppointmentSuccess {
        user_id: String,
        appointment_id: String,
    },
}

impl Route {
    /// The path for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::Register { user_id } => format!("/patients/{user_id}/register"),
            Self::NewAppointment { user_id } => format!("/patients/{user_id}/new-appointment"),
            Self::AppointmentSuccess {
                user_id,
                appointment_id,
            } => format!(
                "/patients/{user_id}/new-appointment/success?appointmentId={appointment_id}"
            ),
        }
    }

    /// Parse a path back into a route.
    ///
    /// A success path without an `appointmentId` parameter yields an empty id,
    /// which later resolves to "not found".
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["admin"] => Some(Self::Admin),
            ["patients", user_id, "register"] => Some(Self::Register {
                user_id: (*user_id).to_string(),
            }),
            ["patients", user_id, "new-appointment"] => Some(Self::NewAppointment {
                user_id: (*user_id).to_string(),
            }),
            ["patients", user_id, "new-appointment", "success"] => {
                let appointment_id = query
                    .into_iter()
                    .flat_map(|q| q.split('&'))
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(k, _)| *k == "appointmentId")
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                Some(Self::AppointmentSuccess {
                    user_id: (*user_id).to_string(),
                    appointment_id,
                })
            }
            _ => None,
        }
    }

    /// Whether the access gate guards this route.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
