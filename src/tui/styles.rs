//! Carepulse color palette and styles.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::AppointmentStatus;

/// Dark theme with green accents.
pub struct CareTheme;

impl CareTheme {
    /// Brand green
    pub const PRIMARY: Color = Color::Rgb(36, 174, 124); // #24AE7C

    pub const PRIMARY_LIGHT: Color = Color::Rgb(78, 207, 160);

    pub const PRIMARY_DARK: Color = Color::Rgb(13, 42, 31); // #0D2A1F

    /// Pending badges
    pub const BLUE: Color = Color::Rgb(121, 181, 236); // #79B5EC

    pub const RED: Color = Color::Rgb(243, 120, 119); // #F37877

    pub const BG_DARK: Color = Color::Rgb(19, 22, 25); // #131619

    pub const BORDER: Color = Color::Rgb(54, 58, 61); // #363A3D

    pub const TEXT_PRIMARY: Color = Color::Rgb(232, 233, 233);

    pub const TEXT_SECONDARY: Color = Color::Rgb(171, 184, 196); // #ABB8C4

    pub const TEXT_MUTED: Color = Color::Rgb(118, 130, 141); // #76828D

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Placeholders and hints
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::RED)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::BLUE)
    }

    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn border_error() -> Style {
        Style::default().fg(Self::RED)
    }

    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Badge color for an appointment status.
    #[must_use]
    pub fn status(status: AppointmentStatus) -> Style {
        match status {
            AppointmentStatus::Scheduled => Self::success(),
            AppointmentStatus::Pending => Self::info(),
            AppointmentStatus::Cancelled => Self::danger(),
        }
        .add_modifier(Modifier::BOLD)
    }
}
