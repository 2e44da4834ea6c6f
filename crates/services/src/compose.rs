use std::collections::BTreeMap;

use fellowpet_config::BrandingSettings;

use crate::channels::{EmailMessage, PushMessage, WaTemplate};

pub const FALLBACK_USER: &str = "A user";
pub const FALLBACK_ACTOR: &str = "Someone";
pub const FALLBACK_EMPLOYEE: &str = "An employee";
pub const FALLBACK_PET_PARENT: &str = "Pet Parent";
pub const FALLBACK_PARTNER: &str = "Boarding Partner";
pub const FALLBACK_TASK_TITLE: &str = "Untitled Task";

/// Long calendar form used in push and email bodies: "November 21".
pub fn format_long_dates(dates: &[bson::DateTime]) -> String {
    dates
        .iter()
        .map(|d| d.to_chrono().format("%B %-d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Long form with weekday and year, used in cancellation notices:
/// "Friday, November 21, 2025".
pub fn format_weekday_dates(dates: &[bson::DateTime]) -> String {
    dates
        .iter()
        .map(|d| d.to_chrono().format("%A, %B %-d, %Y").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compact day/month form used in WhatsApp template parameters: "21/11".
pub fn format_dm_dates(dates: &[bson::DateTime]) -> String {
    dates
        .iter()
        .map(|d| d.to_chrono().format("%-d/%-m").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full date with year for task submissions: "November 21, 2025".
pub fn format_full_date(date: bson::DateTime) -> String {
    date.to_chrono().format("%B %-d, %Y").to_string()
}

/// Builds every outbound message body. Pure; all lookups happen before the
/// composer is called.
#[derive(Clone)]
pub struct Composer {
    branding: BrandingSettings,
}

impl Composer {
    pub fn new(branding: BrandingSettings) -> Self {
        Self { branding }
    }

    /// The bordered card used by operational notification emails.
    fn base_html(&self, content: &str) -> String {
        format!(
            r#"<body style="font-family:Arial,sans-serif;font-size:16px;line-height:1.6;color:#333;padding:20px;">
  <div style="max-width:600px;margin:auto;border:1px solid #ddd;border-radius:8px;padding:20px;">
    <div style="text-align:center;">
      <img src="{logo}" alt="{app} Logo" style="width:100px;height:auto;display:block;margin-bottom:20px;">
    </div>
    {content}
  </div>
</body>"#,
            logo = self.branding.logo_url,
            app = self.branding.app_name,
        )
    }

    /// The branded shell used by account emails (OTP, lock notices).
    fn account_html(&self, body: &str) -> String {
        format!(
            r#"<div style="font-family:Poppins,Arial,sans-serif; background:#f5f6fa; padding:40px 0;">
  <div style="max-width:520px; margin:auto; background:#fff; border-radius:12px; box-shadow:0 4px 14px rgba(0,0,0,0.08); overflow:hidden;">
    <div style="background:{color}; color:#fff; text-align:center; padding:16px 0;">
      <h2 style="margin:0; font-size:22px;">{app}</h2>
    </div>
    <div style="padding:32px; color:#333;">
      {body}
    </div>
    <hr style="border:none; border-top:1px solid #eee;">
    <p style="font-size:12px; color:#999; text-align:center; padding:8px 16px;">
      This is an automated email from {app}. Please do not reply.
    </p>
  </div>
</div>"#,
            color = self.branding.brand_color,
            app = self.branding.app_name,
        )
    }

    fn signoff(&self) -> String {
        format!(
            "<p>Thanks,<br/><strong>{} - Support Team</strong></p>",
            self.branding.app_name
        )
    }

    pub fn booking_request(
        &self,
        user_name: &str,
        user_id: &str,
        long_dates: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "New Booking Request!".into(),
            body: format!(
                "You have a new booking request from {user_name} ({user_id}) on: {long_dates}."
            ),
            data: serde_json::json!({ "action": "new_booking_request" }),
        };
        let email = EmailMessage {
            subject: "📩 New Booking Request!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi there,</p>\
                 <p>You've received a new booking request.</p>\
                 <p><strong>From:</strong> {user_name} ({user_id})</p>\
                 <p><strong>Requested Dates:</strong> {long_dates}</p>\
                 <p>Please log in to your dashboard to view and respond to this request.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn booking_confirmed(
        &self,
        user_name: &str,
        booking_ref: &str,
        long_dates: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "Booking Confirmed!".into(),
            body: format!(
                "You have a new booking confirmation from {user_name} (Booking ID: {booking_ref}) for the following dates: {long_dates}."
            ),
            data: serde_json::json!({ "action": "booking_confirmed", "booking_ref": booking_ref }),
        };
        let email = EmailMessage {
            subject: "✅ Booking Confirmed!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi,</p>\
                 <p>A new booking request has been confirmed by <strong>{user_name}</strong>.</p>\
                 <p><strong>Booking ID:</strong> {booking_ref}</p>\
                 <p><strong>Confirmed Dates:</strong> {long_dates}</p>\
                 <p>Please log in to your dashboard to view the details.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn request_accepted(
        &self,
        long_dates: &str,
        open_time: &str,
        close_time: &str,
        pet_names: &str,
    ) -> PushMessage {
        PushMessage {
            title: "Request Accepted".into(),
            body: format!(
                "Service provider has accepted your booking. Kindly make sure to come on {long_dates} between {open_time} and {close_time} with your {pet_names}."
            ),
            data: serde_json::json!({ "action": "request_accepted" }),
        }
    }

    pub fn request_canceled(&self, reason: &str) -> PushMessage {
        PushMessage {
            title: "Request Canceled".into(),
            body: format!(
                "Service provider has canceled your booking because of {reason}. Tap to know more to see details."
            ),
            data: serde_json::json!({ "action": "request_canceled" }),
        }
    }

    pub fn user_cancellation(
        &self,
        user_name: &str,
        booking_ref: &str,
        weekday_dates: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "Booking Cancelled".into(),
            body: format!(
                "{user_name} (Booking ID: {booking_ref}) cancelled for dates: {weekday_dates}"
            ),
            data: serde_json::json!({ "action": "booking_cancelled", "booking_ref": booking_ref }),
        };
        let email = EmailMessage {
            subject: "🚫 Booking Cancelled!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi,</p>\
                 <p>A booking with ID <strong>{booking_ref}</strong> has been cancelled by <strong>{user_name}</strong>.</p>\
                 <p><strong>Cancelled Dates:</strong> {weekday_dates}</p>\
                 <p>Please check your dashboard for more details.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn partial_cancellation(
        &self,
        user_name: &str,
        booking_ref: &str,
        weekday_dates: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "Booking Partially Cancelled".into(),
            body: format!(
                "{user_name} (Booking ID: {booking_ref}) has cancelled for the following dates: {weekday_dates}."
            ),
            data: serde_json::json!({ "action": "booking_cancelled", "booking_ref": booking_ref }),
        };
        let email = EmailMessage {
            subject: "🚫 Booking Cancelled!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi,</p>\
                 <p>The booking with ID <strong>{booking_ref}</strong> has been partially cancelled by <strong>{user_name}</strong>.</p>\
                 <p><strong>Cancelled Dates:</strong> {weekday_dates}</p>\
                 <p>Please check your dashboard for more details.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn task_assigned(
        &self,
        creator_name: &str,
        assignee_name: &str,
        task_title: &str,
        task_description: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "New Task Assigned!".into(),
            body: format!("{creator_name} has assigned you a new task."),
            data: serde_json::json!({ "action": "new_task_assigned" }),
        };
        let email = EmailMessage {
            subject: "📌 New Task Assigned!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi {assignee_name},</p>\
                 <p><strong>{creator_name}</strong> has assigned you a new task.</p>\
                 <p><strong>Task Title:</strong> {task_title}</p>\
                 <p><strong>Description:</strong> {task_description}</p>\
                 <p>Please log in to your dashboard to view and complete this task.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn task_submitted(
        &self,
        assignee_name: &str,
        creator_name: &str,
        task_title: &str,
        submitted_date: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "Task Submitted! 🎉".into(),
            body: format!(
                "{assignee_name} has submitted the task: \"{task_title}\" on {submitted_date}."
            ),
            data: serde_json::json!({ "action": "task_submitted" }),
        };
        let email = EmailMessage {
            subject: "✅ Task Submitted!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi {creator_name},</p>\
                 <p>The task <strong>\"{task_title}\"</strong> has been submitted by {assignee_name}.</p>\
                 <p>You can review the submitted work in your dashboard.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn employee_added(
        &self,
        employee_name: &str,
        employee_role: &str,
    ) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "New Employee Added!".into(),
            body: format!(
                "{employee_name} has been added as a {employee_role}. Check your dashboard for more details."
            ),
            data: serde_json::json!({ "action": "new_employee_added" }),
        };
        let email = EmailMessage {
            subject: "🔔 New Employee Added!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi there,</p>\
                 <p>A new employee, <strong>{employee_name}</strong>, has been added to your team with the <strong>role: {employee_role}</strong>.</p>\
                 <p>Please log in to your dashboard to manage your employee list.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    /// The three review outcomes: everything rejected, a mixed review, or
    /// everything approved.
    pub fn edit_request_outcome(
        &self,
        approved_fields: &[String],
        rejected_fields: &BTreeMap<String, String>,
        total_changes: usize,
    ) -> (PushMessage, EmailMessage) {
        if !rejected_fields.is_empty() && rejected_fields.len() == total_changes {
            let push = PushMessage {
                title: "Profile Edit Request Rejected".into(),
                body: "Your profile edit request was reviewed, but all of the requested changes were rejected. Kindly check your dashboard for details.".into(),
                data: serde_json::json!({ "action": "profile_edit_reviewed" }),
            };
            let email = EmailMessage {
                subject: "Profile Edit Request Rejected".into(),
                html_body: self.base_html(&format!(
                    "<p>Hi there,</p>\
                     <p>Your recent profile edit request has been fully reviewed and <strong>all of the requested changes were rejected</strong>.</p>\
                     <p>Kindly log in to your dashboard for more details.</p>{}",
                    self.signoff()
                )),
            };
            (push, email)
        } else if !rejected_fields.is_empty() {
            let rejected_names = rejected_fields
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            let rejected_items = rejected_fields
                .iter()
                .map(|(field, reason)| {
                    format!("<li><strong>{field}</strong> (Reason: {reason})</li>")
                })
                .collect::<String>();
            let approved_items = approved_fields
                .iter()
                .map(|field| format!("<li><strong>{field}</strong></li>"))
                .collect::<String>();

            let push = PushMessage {
                title: "Profile Edit Request Reviewed".into(),
                body: format!(
                    "Your profile edit request was reviewed. Some fields were rejected: {rejected_names}. Kindly check your dashboard for details."
                ),
                data: serde_json::json!({ "action": "profile_edit_reviewed" }),
            };
            let email = EmailMessage {
                subject: "Your profile edit request has been reviewed".into(),
                html_body: self.base_html(&format!(
                    "<p>Hi there,</p>\
                     <p>Your recent profile edit request was reviewed. The following fields were rejected:</p>\
                     <ul>{rejected_items}</ul>\
                     <p>The following fields were approved:</p>\
                     <ul>{approved_items}</ul>\
                     <p>Kindly log in to your dashboard for more details.</p>{}",
                    self.signoff()
                )),
            };
            (push, email)
        } else {
            let approved_items = approved_fields
                .iter()
                .map(|field| format!("<li><strong>{field}</strong></li>"))
                .collect::<String>();

            let push = PushMessage {
                title: "Profile Edit Request Approved! 🎉".into(),
                body: "Your profile edit request has been approved and your changes are now live."
                    .into(),
                data: serde_json::json!({ "action": "profile_edit_reviewed" }),
            };
            let email = EmailMessage {
                subject: "Profile Edit Request Approved! 🎉".into(),
                html_body: self.base_html(&format!(
                    "<p>Hi there,</p>\
                     <p>Your recent profile edit request has been <strong>approved</strong> and your changes are now live!</p>\
                     <p>The following fields were updated:</p>\
                     <ul>{approved_items}</ul>{}",
                    self.signoff()
                )),
            };
            (push, email)
        }
    }

    pub fn approval_granted(&self, shop_name: &str) -> (PushMessage, EmailMessage) {
        let push = PushMessage {
            title: "Congratulations! Your Profile is Live! 🎉".into(),
            body: format!(
                "Your application for {shop_name} has been approved. You are now listed on the user application!"
            ),
            data: serde_json::json!({ "action": "admin_approved" }),
        };
        let email = EmailMessage {
            subject: "✅ Your Profile Has Been Approved!".into(),
            html_body: self.base_html(&format!(
                "<p>Hi,</p>\
                 <p>We are excited to let you know that your application for <strong>{shop_name}</strong> has been reviewed and approved!</p>\
                 <p>Your business profile is now live and listed on the application for customers to find.</p>{}",
                self.signoff()
            )),
        };
        (push, email)
    }

    pub fn suspension_approved(&self) -> PushMessage {
        PushMessage {
            title: "Account Suspension Approved".into(),
            body: "Your account suspension request has been approved by admin and you are no more listed in the user application.".into(),
            data: serde_json::json!({ "action": "display_status_change" }),
        }
    }

    pub fn live_again(&self) -> PushMessage {
        PushMessage {
            title: "You Are Live Again!".into(),
            body: "You are now live again and users can see your shop and make bookings.".into(),
            data: serde_json::json!({ "action": "display_status_change" }),
        }
    }

    pub fn chat_message(&self, user_name: &str, booking_ref: &str) -> PushMessage {
        PushMessage {
            title: format!("New Message from {user_name}!"),
            body: format!(
                "{user_name} (booking ID: {booking_ref}) wants to talk to you! Kindly open their chat."
            ),
            data: serde_json::json!({ "action": "chat_message", "booking_ref": booking_ref }),
        }
    }

    /// OTP email for verifying a service's notification address.
    pub fn notification_email_otp(&self, code: &str) -> EmailMessage {
        let app = &self.branding.app_name;
        let color = &self.branding.brand_color;
        EmailMessage {
            subject: format!("Your {app} Email Verification Code"),
            html_body: format!(
                r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333333; max-width: 600px; margin: 0 auto; border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden;">
  <div style="background-color: #2D3748; color: #ffffff; padding: 20px; text-align: center;">
    <h1 style="margin: 0; font-size: 24px; font-weight: 600;">{app} Verification</h1>
  </div>
  <div style="padding: 30px;">
    <p style="font-size: 16px;">Hello,</p>
    <p style="font-size: 16px;">Thank you for starting your partnership application with <strong>{app}</strong>. Please use the <strong>One-Time Password (OTP)</strong> below to verify your notification email address.</p>
    <div style="text-align: center; margin: 30px 0; border: 2px dashed {color}; border-radius: 8px; background-color: #F7FAFC; padding: 20px;">
      <p style="font-size: 14px; color: #718096; margin-bottom: 5px;">Your Verification Code:</p>
      <h2 style="font-size: 32px; letter-spacing: 5px; color: {color}; margin: 5px 0; font-weight: bold;">{code}</h2>
    </div>
    <p style="font-size: 14px; color: #E53E3E;">This code is valid for 10 minutes only. Do not share this code with anyone.</p>
    <p style="font-size: 16px;">If you did not request this code, please ignore this email.</p>
    <p style="font-size: 16px; margin-top: 30px;">Best regards,<br>The {app} Team</p>
  </div>
</div>"#
            ),
        }
    }

    /// OTP email for new-account signup verification.
    pub fn signup_otp(&self, code: &str) -> EmailMessage {
        let app = &self.branding.app_name;
        let color = &self.branding.brand_color;
        EmailMessage {
            subject: format!("{app} - Verify your Email"),
            html_body: self.account_html(&format!(
                r#"<p>Welcome!</p>
<p>To complete your account setup, please verify your email address.</p>
<p style="text-align:center; margin:20px 0;">
  <span style="display:inline-block; background:{color}; color:#fff; padding:10px 18px; border-radius:8px; font-size:22px; font-weight:bold; letter-spacing:2px;">{code}</span>
</p>"#
            )),
        }
    }

    /// OTP email for unlocking a locked account.
    pub fn unlock_otp(&self, code: &str) -> EmailMessage {
        let app = &self.branding.app_name;
        let color = &self.branding.brand_color;
        EmailMessage {
            subject: format!("{app} - Your 6-digit Verification Code"),
            html_body: self.account_html(&format!(
                r#"<p>Hi there,</p>
<p>We received a request to verify your {app} account.</p>
<p style="text-align:center; margin:20px 0;">
  <span style="display:inline-block; background:{color}; color:#fff; padding:10px 18px; border-radius:8px; font-size:22px; font-weight:bold; letter-spacing:2px;">{code}</span>
</p>
<p>This code will expire in 15 minutes. If you didn't request this, ignore this email.</p>"#
            )),
        }
    }

    pub fn account_locked(&self) -> EmailMessage {
        let app = &self.branding.app_name;
        EmailMessage {
            subject: format!("{app} Account Locked for Security"),
            html_body: self.account_html(&format!(
                "<p>Hello,</p>\
                 <p>Your {app} account has been temporarily locked for security reasons.</p>\
                 <p>We noticed a login attempt after more than 60 days of inactivity. To protect your data, we've paused access for <b>72 hours</b>.</p>\
                 <p>If this was you, simply log in again within 72 hours using your verified PIN to restore access.</p>\
                 <p>If no action is taken, we'll safely remove the old account so the number can be reused.</p>\
                 <p style=\"margin-top:20px;\">Stay safe,<br>The {app} Team</p>"
            )),
        }
    }

    pub fn account_removed(&self) -> EmailMessage {
        let app = &self.branding.app_name;
        EmailMessage {
            subject: format!("{app} Account Removed"),
            html_body: self.account_html(&format!(
                "<p>Hello,</p>\
                 <p>As part of our security policy, your {app} account has been safely removed because it remained locked for over 72 hours.</p>\
                 <p>If you are the rightful owner, you can always re-register anytime using your number.</p>\
                 <p>Thank you,<br>The {app} Team</p>"
            )),
        }
    }

    /// Magic-link email sent to one party of an email-change request.
    pub fn email_change_confirmation(&self, is_old: bool, link: &str) -> EmailMessage {
        let (which, subject) = if is_old {
            ("current", "Confirm Your CURRENT Email")
        } else {
            ("new", "Confirm Your NEW Email")
        };
        EmailMessage {
            subject: subject.into(),
            html_body: format!(
                "<p>Please confirm your <strong>{which}</strong> email by clicking below:</p>\
                 <a href=\"{link}\">Confirm {} Email</a>",
                if is_old { "Old" } else { "New" }
            ),
        }
    }

    /// HTML page shown after a confirmation link is clicked.
    pub fn email_change_confirmed_page(&self, is_old: bool) -> String {
        format!(
            "<html><body style=\"font-family:Arial,sans-serif;text-align:center;padding:40px\">\
             <h2>{} email verified!</h2>\
             <p>You can now return to the app to finish the update.</p>\
             </body></html>",
            if is_old { "Old" } else { "New" }
        )
    }

    pub fn wa_sp_confirmed(
        user_name: &str,
        shop_name: &str,
        booking_ref: &str,
        dm_dates: &str,
        pet_names: &str,
    ) -> WaTemplate {
        WaTemplate::new(
            "sp_confirmed_overnight_boarding_request",
            vec![
                user_name.to_string(),
                shop_name.to_string(),
                booking_ref.to_string(),
                dm_dates.to_string(),
                pet_names.to_string(),
            ],
        )
    }

    pub fn wa_booking_confirmation(
        user_name: &str,
        order_ref: &str,
        shop_name: &str,
        dm_dates: &str,
        pet_names: &str,
        drop_date: &str,
        drop_time: &str,
    ) -> WaTemplate {
        WaTemplate::new(
            "user_boarding_booking_confirmation",
            vec![
                user_name.to_string(),
                order_ref.to_string(),
                shop_name.to_string(),
                dm_dates.to_string(),
                pet_names.to_string(),
                drop_date.to_string(),
                drop_time.to_string(),
            ],
        )
    }

    pub fn wa_order_done(user_name: &str, shop_name: &str) -> WaTemplate {
        WaTemplate::new(
            "user_boarding_order_done",
            vec![user_name.to_string(), shop_name.to_string()],
        )
    }
}
