//! Stack-file fixtures.

/// An empty per-service file
pub const EMPTY: &str = "";

/// A generated `system-auth` with 21 entries across all four phases.
///
/// Entry ordinals (1-based) worth knowing:
/// - 1: `auth required pam_env.so`
/// - 5: `auth required pam_deny.so`
/// - 9: `account [default=bad success=ok user_unknown=ignore] pam_sss.so`
/// - 11: `password requisite pam_pwquality.so try_first_pass retry=3 type=`
/// - 17: `-session optional pam_systemd.so`
pub const FULL: &str = "\
#%PAM-1.0
# This file is auto-generated.
# User changes will be destroyed the next time authconfig is run.
auth        required      pam_env.so
auth        sufficient    pam_unix.so nullok try_first_pass
auth        requisite     pam_succeed_if.so uid >= 1000 quiet_success
auth        sufficient    pam_sss.so use_first_pass
auth        required      pam_deny.so

account     required      pam_unix.so broken_shadow
account     sufficient    pam_localuser.so
account     sufficient    pam_succeed_if.so uid < 1000 quiet
account     [default=bad success=ok user_unknown=ignore] pam_sss.so
account     required      pam_permit.so

password    requisite     pam_pwquality.so try_first_pass retry=3 type=
password    sufficient    pam_unix.so sha512 shadow nullok try_first_pass use_authtok
password    sufficient    pam_sss.so use_authtok
password    required      pam_deny.so

session     optional      pam_keyinit.so revoke
session     required      pam_limits.so
-session     optional      pam_systemd.so
session     optional      pam_oddjob_mkhomedir.so umask=0077
session     [success=1 default=ignore] pam_succeed_if.so service in crond quiet use_uid
session     required      pam_unix.so
session     optional      pam_sss.so
";

/// A file that does not parse: line 4 has no module
pub const BROKEN: &str = "\
#%PAM-1.0
auth        required      pam_env.so
auth        sufficient    pam_unix.so nullok try_first_pass
auth        required
";

/// A combined multi-service file
pub const PAM_CONF: &str = "\
# PAM configuration
login   auth        required    pam_unix.so
login   account     required    pam_unix.so
sshd    auth        required    pam_env.so
sshd    auth        sufficient  pam_unix.so nullok
sshd    auth        required    pam_deny.so
other   auth        required    pam_deny.so
";
