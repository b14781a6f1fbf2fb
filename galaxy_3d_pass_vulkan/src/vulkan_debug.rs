/// Vulkan debug messenger - forwards validation layer messages to the engine logger
///
/// Only installed when the `vulkan-validation` feature is enabled.

use ash::vk;
use galaxy_3d_pass::{engine_error, engine_warn, engine_debug};
use std::ffi::CStr;

/// Vulkan debug messenger callback
///
/// Errors and warnings keep their severity; everything else is logged at DEBUG.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        engine_error!("galaxy3d::vulkan::validation", "[{}] {}: {}", type_str, message_id_name, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        engine_warn!("galaxy3d::vulkan::validation", "[{}] {}: {}", type_str, message_id_name, message);
    } else {
        engine_debug!("galaxy3d::vulkan::validation", "[{}] {}: {}", type_str, message_id_name, message);
    }

    vk::FALSE
}
