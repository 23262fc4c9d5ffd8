//! Artifact fixtures shaped like the broker repositories.
//!
//! `populated` holds namespace `team` with queue `team.queue.payments` and topic
//! `team.topic.events` (subscription `existing-sub` for `svcE`). `bare` holds only the
//! broker skeleton, so any namespace is new.

use acmq_provision::ArtifactTexts;

pub const POPULATED_LEDGER: &str = r#"---
icc_artemis_broker::artemis_broker_name: 'acmq01'

icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  - 'svcP'
  - 'svcE'
  - 'svcB'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
  - group: 'svcP'
    users: 'svcP'
  - group: 'svcE'
    users: 'svcE'
  - group: 'svcB'
    users: 'svcB'
  - group: 'team-admin'
    users: 'admin'
  - group: 'team-read'
    users: 'svcE,svcB'
  - group: 'team-write'
    users: 'svcP'

icc_artemis_broker::artemis_jvm_heap: '2G'
"#;

pub const POPULATED_VARIABLES: &str = r#"# Class: icc_artemis_broker
#
# Installs and configures an Artemis broker.
#
class icc_artemis_broker (
  $broker_name                                 = 'acmq01',
  $jvm_heap                                    = '2G',
  $address_team_queue_payments                 = 'team.queue.payments',
  $anycast_team_queue_payments                 = 'team.queue.payments',
  $address_team_topic_events                   = 'team.topic.events',
  $multicast_existing_sub                      = 'existing-sub',
) {

  # VALIDATES
  validate_string($broker_name)
  validate_string($address_team_queue_payments)
  validate_string($anycast_team_queue_payments)
  validate_string($address_team_topic_events)
  validate_string($multicast_existing_sub)

  # REPOS
  include icc_artemis_broker::repos
  include icc_artemis_broker::install
}
"#;

pub const POPULATED_TOPOLOGY: &str = r##"<?xml version='1.0'?>
<configuration xmlns="urn:activemq" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
   <core xmlns="urn:activemq:core">
      <name><%= @broker_name %></name>
      <security-settings>
         <security-setting match="#">
            <permission type="manage" roles="amq"/>
         </security-setting>
         <security-setting match="team.#">
            <permission type="createDurableQueue" roles="team-admin,team-write,team-read"/>
            <permission type="deleteDurableQueue" roles="team-admin"/>
            <permission type="consume" roles="team-admin,team-read"/>
            <permission type="browse" roles="team-admin,team-read"/>
            <permission type="send" roles="team-admin,team-write"/>
            <permission type="manage" roles="team-admin"/>
         </security-setting>
         <security-setting match="<%= @address_team_queue_payments %>.#">
            <permission type="send" roles="team-admin,svcP"/>
            <permission type="consume" roles="team-admin,svcB"/>
            <permission type="browse" roles="team-admin,svcB"/>
         </security-setting>
         <security-setting match="<%= @address_team_topic_events %>.#">
            <permission type="send" roles="team-admin,team-write"/>
            <permission type="consume" roles="team-admin,svcE"/>
            <permission type="browse" roles="team-admin,svcE"/>
         </security-setting>
         <security-setting match="<%= @address_team_topic_events %>::<%= @multicast_existing_sub %>">
            <permission type="consume" roles="team-admin,svcE"/>
            <permission type="browse" roles="team-admin,svcE"/>
         </security-setting>
      </security-settings>
      <addresses>
         <address name="DLQ">
            <anycast>
               <queue name="DLQ"/>
            </anycast>
         </address>
         <address name="<%= @address_team_queue_payments %>">
            <anycast>
               <queue name="<%= @anycast_team_queue_payments %>"/>
            </anycast>
         </address>
         <address name="<%= @address_team_topic_events %>">
            <multicast>
               <queue name="<%= @multicast_existing_sub %>"/>
            </multicast>
         </address>
      </addresses>
   </core>
</configuration>
"##;

pub const BARE_LEDGER: &str = r#"---
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
"#;

pub const BARE_VARIABLES: &str = r#"class icc_artemis_broker (
  $broker_name                                 = 'acmq01',
) {

  # VALIDATES
  validate_string($broker_name)

  # REPOS
  include icc_artemis_broker::repos
}
"#;

pub const BARE_TOPOLOGY: &str = r##"<?xml version='1.0'?>
<configuration xmlns="urn:activemq">
   <core xmlns="urn:activemq:core">
      <security-settings>
         <security-setting match="#">
            <permission type="manage" roles="amq"/>
         </security-setting>
      </security-settings>
      <addresses>
         <address name="DLQ">
            <anycast>
               <queue name="DLQ"/>
            </anycast>
         </address>
      </addresses>
   </core>
</configuration>
"##;

pub fn populated() -> ArtifactTexts {
    ArtifactTexts {
        ledger: POPULATED_LEDGER.to_string(),
        variables: POPULATED_VARIABLES.to_string(),
        topology: POPULATED_TOPOLOGY.to_string(),
    }
}

pub fn bare() -> ArtifactTexts {
    ArtifactTexts {
        ledger: BARE_LEDGER.to_string(),
        variables: BARE_VARIABLES.to_string(),
        topology: BARE_TOPOLOGY.to_string(),
    }
}
